//! Cached, read-only reference data: languages, topics, levels.

use std::collections::BTreeSet;

use vocab_core::Clock;
use vocab_core::model::{Language, LanguageId, Level, Topic, TopicId};

use crate::cache::QueryCache;
use crate::error::ApiError;
use crate::http::{HttpClient, RequestOptions};

const DEFAULT_SOURCE_CODE: &str = "en";

pub struct ReferenceService {
    http: HttpClient,
    languages: QueryCache<(), Vec<Language>>,
    topics: QueryCache<(), Vec<Topic>>,
    levels: QueryCache<Option<LanguageId>, Vec<Level>>,
}

impl ReferenceService {
    #[must_use]
    pub fn new(http: HttpClient, clock: Clock) -> Self {
        Self {
            http,
            languages: QueryCache::new("languages", clock.clone()),
            topics: QueryCache::new("topics", clock.clone()),
            levels: QueryCache::new("levels", clock),
        }
    }

    /// All dictionary languages. A missing `data` field yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn languages(&self) -> Result<Vec<Language>, ApiError> {
        let http = &self.http;
        self.languages
            .get_or_fetch((), || async move {
                let languages: Option<Vec<Language>> = http.get("/reference/languages").await?;
                Ok(languages.unwrap_or_default())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn topics(&self) -> Result<Vec<Topic>, ApiError> {
        let http = &self.http;
        self.topics
            .get_or_fetch((), || async move {
                let topics: Option<Vec<Topic>> = http.get("/reference/topics").await?;
                Ok(topics.unwrap_or_default())
            })
            .await
    }

    /// Levels, optionally scoped to one source language. Each filter value
    /// is cached separately.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn levels(&self, language_id: Option<LanguageId>) -> Result<Vec<Level>, ApiError> {
        let http = &self.http;
        self.levels
            .get_or_fetch(language_id, || async move {
                let mut options = RequestOptions::new();
                if let Some(language_id) = language_id {
                    options = options.query("languageId", language_id);
                }
                let levels: Option<Vec<Level>> =
                    http.get_with("/reference/levels", &options).await?;
                Ok(levels.unwrap_or_default())
            })
            .await
    }

    /// Drop every cached reference list.
    pub fn invalidate(&self) {
        self.languages.invalidate_all();
        self.topics.invalidate_all();
        self.levels.invalidate_all();
    }
}

// ─── Configuration helpers ───────────────────────────────────────────────────

/// English when available, otherwise the first language.
#[must_use]
pub fn default_source_language(languages: &[Language]) -> Option<&Language> {
    languages
        .iter()
        .find(|language| language.code.eq_ignore_ascii_case(DEFAULT_SOURCE_CODE))
        .or_else(|| languages.first())
}

/// Every language except `source`.
#[must_use]
pub fn target_languages_for(languages: &[Language], source: LanguageId) -> Vec<&Language> {
    languages
        .iter()
        .filter(|language| language.id != source)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicFilter {
    #[default]
    All,
    Selected,
    Unselected,
}

/// Topics matching `search` (case-insensitive) and the selection filter.
#[must_use]
pub fn filter_topics<'a>(
    topics: &'a [Topic],
    search: &str,
    filter: TopicFilter,
    selected: &BTreeSet<TopicId>,
) -> Vec<&'a Topic> {
    topics
        .iter()
        .filter(|topic| topic.matches(search))
        .filter(|topic| match filter {
            TopicFilter::All => true,
            TopicFilter::Selected => selected.contains(&topic.id),
            TopicFilter::Unselected => !selected.contains(&topic.id),
        })
        .collect()
}
