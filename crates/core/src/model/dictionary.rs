use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LanguageId, LevelId, SenseId, WordId};

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub language_id: LanguageId,
    pub lemma: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma_normalized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_rank: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Synonym,
    Antonym,
    Related,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRelation {
    pub relation_type: RelationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub target_word: Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleTranslation {
    pub language: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: i64,
    pub source_sense_id: SenseId,
    pub language_id: LanguageId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub translations: Vec<ExampleTranslation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pronunciation {
    pub id: i64,
    pub word_id: WordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// One meaning of a word with its translations and usage examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseDetail {
    pub id: SenseId,
    pub sense_order: u32,
    pub part_of_speech_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech_name: Option<String>,
    pub definition: String,
    pub definition_language_id: LanguageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_language_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<LevelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub translations: Vec<Word>,
    #[serde(default)]
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDetail {
    pub word: Word,
    #[serde(default)]
    pub senses: Vec<SenseDetail>,
    #[serde(default)]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(default)]
    pub relations: Vec<WordRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSearchResponse {
    pub words: Vec<Word>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SearchError {
    #[error("search text is empty")]
    EmptyQuery,
    #[error("language_id must be a positive id")]
    InvalidLanguage,
}

/// Validated dictionary search parameters; also the cache key for results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    text: String,
    language_id: LanguageId,
    limit: u32,
    offset: u32,
}

impl SearchQuery {
    /// # Errors
    ///
    /// Returns `SearchError` when the trimmed text is empty or the language id
    /// is not positive.
    pub fn new(text: &str, language_id: LanguageId) -> Result<Self, SearchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if !language_id.is_valid() {
            return Err(SearchError::InvalidLanguage);
        }
        Ok(Self {
            text: text.to_owned(),
            language_id,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        })
    }

    /// Set paging; `limit` is clamped to `1..=MAX_SEARCH_LIMIT`.
    #[must_use]
    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn language_id(&self) -> LanguageId {
        self.language_id
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Query-string pairs in wire order.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.text.clone()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("languageId", self.language_id.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_trims_and_defaults_paging() {
        let query = SearchQuery::new("  house ", LanguageId::new(1)).unwrap();
        assert_eq!(query.text(), "house");
        assert_eq!(query.limit(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn query_rejects_blank_text() {
        assert_eq!(
            SearchQuery::new("   ", LanguageId::new(1)).unwrap_err(),
            SearchError::EmptyQuery
        );
    }

    #[test]
    fn limit_is_clamped() {
        let query = SearchQuery::new("a", LanguageId::new(1)).unwrap();
        assert_eq!(query.clone().with_page(0, 0).limit(), 1);
        assert_eq!(query.with_page(500, 40).limit(), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn word_detail_defaults_missing_collections() {
        let json = serde_json::json!({
            "word": {"id": 1, "language_id": 1, "lemma": "house"}
        });
        let detail: WordDetail = serde_json::from_value(json).unwrap();
        assert!(detail.senses.is_empty());
        assert!(detail.relations.is_empty());
    }
}
