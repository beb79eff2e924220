use serde::{Deserialize, Serialize};

use crate::model::{LanguageId, LevelId, TopicId};

/// Dictionary language, e.g. `en` / English.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: LanguageId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub code: String,
    pub name: String,
}

/// Proficiency level; levels may be scoped to one source language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_id: Option<LanguageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_order: Option<i32>,
}

impl Topic {
    /// Case-insensitive substring match on the display name.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        needle.is_empty() || self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}
