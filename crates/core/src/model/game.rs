use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerId, LanguageId, LevelId, OptionId, QuestionId, SessionId, TopicId, UserId, WordId};

//
// ─── CONFIGURATION ─────────────────────────────────────────────────────────────
//

/// Question sourcing strategy for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Topic,
    Level,
}

impl GameMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Topic => "topic",
            GameMode::Level => "level",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topic" => Ok(GameMode::Topic),
            "level" => Ok(GameMode::Level),
            other => Err(ConfigError::UnknownMode(other.to_owned())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("select both a source and a target language")]
    MissingLanguages,

    #[error("source and target languages must be different")]
    SameLanguage,

    #[error("select a game mode")]
    MissingMode,

    #[error("unknown game mode: {0}")]
    UnknownMode(String),

    #[error("topic mode requires a topic")]
    MissingTopic,

    #[error("level mode requires a level")]
    MissingLevel,

    #[error("{mode} mode does not accept {field}")]
    ConflictingFilters { mode: GameMode, field: &'static str },

    #[error("{field} must be a positive id")]
    InvalidId { field: &'static str },
}

/// Exclusive question selector; which variant applies is fixed by the mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionFilter {
    Topic(TopicId),
    /// An empty `topic_ids` list means every topic at this level.
    Level {
        level_id: LevelId,
        topic_ids: Vec<TopicId>,
    },
}

impl QuestionFilter {
    #[must_use]
    pub fn mode(&self) -> GameMode {
        match self {
            QuestionFilter::Topic(_) => GameMode::Topic,
            QuestionFilter::Level { .. } => GameMode::Level,
        }
    }
}

/// Raw configuration as collected by the configuration step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfigDraft {
    pub source_language_id: Option<LanguageId>,
    pub target_language_id: Option<LanguageId>,
    pub mode: Option<GameMode>,
    pub topic_id: Option<TopicId>,
    pub level_id: Option<LevelId>,
    pub topic_ids: Vec<TopicId>,
}

impl SessionConfigDraft {
    #[must_use]
    pub fn level(source: LanguageId, target: LanguageId, level_id: LevelId) -> Self {
        Self {
            source_language_id: Some(source),
            target_language_id: Some(target),
            mode: Some(GameMode::Level),
            level_id: Some(level_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn topic(source: LanguageId, target: LanguageId, topic_id: TopicId) -> Self {
        Self {
            source_language_id: Some(source),
            target_language_id: Some(target),
            mode: Some(GameMode::Topic),
            topic_id: Some(topic_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_topics(mut self, topic_ids: impl IntoIterator<Item = TopicId>) -> Self {
        self.topic_ids = topic_ids.into_iter().collect();
        self
    }

    /// Validate the draft into an immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found, checking languages first, then
    /// the mode and its selector.
    pub fn validate(&self) -> Result<SessionConfig, ConfigError> {
        let (Some(source), Some(target)) = (self.source_language_id, self.target_language_id)
        else {
            return Err(ConfigError::MissingLanguages);
        };
        if source == target {
            return Err(ConfigError::SameLanguage);
        }
        let mode = self.mode.ok_or(ConfigError::MissingMode)?;

        match mode {
            GameMode::Topic if self.topic_id.is_none() => return Err(ConfigError::MissingTopic),
            GameMode::Level if self.level_id.is_none() => return Err(ConfigError::MissingLevel),
            _ => {}
        }

        match mode {
            GameMode::Topic if self.level_id.is_some() => {
                return Err(ConfigError::ConflictingFilters { mode, field: "level_id" });
            }
            GameMode::Topic if !self.topic_ids.is_empty() => {
                return Err(ConfigError::ConflictingFilters { mode, field: "topic_ids" });
            }
            GameMode::Level if self.topic_id.is_some() => {
                return Err(ConfigError::ConflictingFilters { mode, field: "topic_id" });
            }
            _ => {}
        }

        ensure_positive(source.is_valid(), "source_language_id")?;
        ensure_positive(target.is_valid(), "target_language_id")?;
        let filter = match (mode, self.topic_id, self.level_id) {
            (GameMode::Topic, Some(topic_id), _) => {
                ensure_positive(topic_id.is_valid(), "topic_id")?;
                QuestionFilter::Topic(topic_id)
            }
            (GameMode::Level, _, Some(level_id)) => {
                ensure_positive(level_id.is_valid(), "level_id")?;
                for topic_id in &self.topic_ids {
                    ensure_positive(topic_id.is_valid(), "topic_ids")?;
                }
                let mut topic_ids = self.topic_ids.clone();
                topic_ids.sort_unstable();
                topic_ids.dedup();
                QuestionFilter::Level { level_id, topic_ids }
            }
            (GameMode::Topic, None, _) => return Err(ConfigError::MissingTopic),
            (GameMode::Level, _, None) => return Err(ConfigError::MissingLevel),
        };

        Ok(SessionConfig {
            source_language_id: source,
            target_language_id: target,
            filter,
        })
    }
}

fn ensure_positive(valid: bool, field: &'static str) -> Result<(), ConfigError> {
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidId { field })
    }
}

/// Validated session configuration; fixed for the lifetime of a play-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    source_language_id: LanguageId,
    target_language_id: LanguageId,
    filter: QuestionFilter,
}

impl SessionConfig {
    #[must_use]
    pub fn source_language_id(&self) -> LanguageId {
        self.source_language_id
    }

    #[must_use]
    pub fn target_language_id(&self) -> LanguageId {
        self.target_language_id
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.filter.mode()
    }

    #[must_use]
    pub fn filter(&self) -> &QuestionFilter {
        &self.filter
    }

    /// Wire body for the create-session call.
    #[must_use]
    pub fn to_request(&self) -> CreateSessionRequest {
        let (topic_id, level_id, topic_ids) = match &self.filter {
            QuestionFilter::Topic(topic_id) => (Some(*topic_id), None, Vec::new()),
            QuestionFilter::Level { level_id, topic_ids } => {
                (None, Some(*level_id), topic_ids.clone())
            }
        };
        CreateSessionRequest {
            mode: self.mode(),
            source_language_id: self.source_language_id,
            target_language_id: self.target_language_id,
            topic_id,
            level_id,
            topic_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub mode: GameMode,
    pub source_language_id: LanguageId,
    pub target_language_id: LanguageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<LevelId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_ids: Vec<TopicId>,
}

//
// ─── SESSION PAYLOADS ──────────────────────────────────────────────────────────
//

/// Server-side record of a play-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub mode: GameMode,
    pub source_language_id: LanguageId,
    pub target_language_id: LanguageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<LevelId>,
    pub total_questions: u32,
    #[serde(default)]
    pub correct_questions: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            OptionLabel::A => 'A',
            OptionLabel::B => 'B',
            OptionLabel::C => 'C',
            OptionLabel::D => 'D',
        }
    }

    /// Parse a user-typed label, case-insensitively.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One selectable answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    #[serde(rename = "option_label")]
    pub label: OptionLabel,
    pub target_word_id: WordId,
    pub word_text: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {question_id} has {count} options, expected 4")]
    WrongOptionCount { question_id: QuestionId, count: usize },

    #[error("question {question_id} repeats option label {label}")]
    DuplicateLabel { question_id: QuestionId, label: OptionLabel },

    #[error("option {option_id} does not belong to question {question_id}")]
    ForeignOption { question_id: QuestionId, option_id: OptionId },

    #[error("question {question_id} does not belong to session {session_id}")]
    ForeignQuestion { question_id: QuestionId, session_id: SessionId },
}

/// Multiple-choice prompt: translate `source_word_text` by picking one of four options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub session_id: SessionId,
    #[serde(rename = "question_order")]
    pub order: u32,
    #[serde(default)]
    pub question_type: String,
    pub source_word_id: WordId,
    #[serde(default)]
    pub source_word_text: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Check the option set and sort it by label.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` unless there are exactly four options, labelled
    /// A–D once each, all pointing back at this question.
    pub fn validate(mut self) -> Result<Self, QuestionError> {
        if self.options.len() != OptionLabel::ALL.len() {
            return Err(QuestionError::WrongOptionCount {
                question_id: self.id,
                count: self.options.len(),
            });
        }
        if let Some(foreign) = self.options.iter().find(|o| o.question_id != self.id) {
            return Err(QuestionError::ForeignOption {
                question_id: self.id,
                option_id: foreign.id,
            });
        }

        self.options.sort_by_key(|o| o.label);
        for pair in self.options.windows(2) {
            if pair[0].label == pair[1].label {
                return Err(QuestionError::DuplicateLabel {
                    question_id: self.id,
                    label: pair[0].label,
                });
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn option_by_label(&self, label: OptionLabel) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.label == label)
    }
}

/// Session payload: the record plus its ordered question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWithQuestions {
    pub session: GameSession,
    pub questions: Vec<Question>,
}

impl SessionWithQuestions {
    /// Validate every question and order them by `question_order`.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` encountered.
    pub fn validate(self) -> Result<Self, QuestionError> {
        let session_id = self.session.id;
        let mut questions = self
            .questions
            .into_iter()
            .map(|question| {
                if question.session_id != session_id {
                    return Err(QuestionError::ForeignQuestion {
                        question_id: question.id,
                        session_id,
                    });
                }
                question.validate()
            })
            .collect::<Result<Vec<_>, _>>()?;
        questions.sort_by_key(|q| q.order);
        Ok(Self {
            session: self.session,
            questions,
        })
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: QuestionId,
    pub selected_option_id: OptionId,
    pub response_time_ms: u64,
}

/// Scored answer as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub session_id: SessionId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<OptionId>,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub answered_at: DateTime<Utc>,
}

/// Server-computed statistics for a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub session_id: SessionId,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_response_time_ms: Option<u64>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
