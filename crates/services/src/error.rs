//! Shared error types for the services crate.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use vocab_core::ValidationError;
use vocab_core::model::{ConfigError, OptionId, QuestionError, QuestionId, SearchError};

/// Well-known backend error codes.
pub mod codes {
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const INSUFFICIENT_WORDS: &str = "INSUFFICIENT_WORDS";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVALID_MODE: &str = "INVALID_MODE";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const ANSWER_ALREADY_SUBMITTED: &str = "ANSWER_ALREADY_SUBMITTED";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
}

/// Errors loading `ApiConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigLoadError {
    #[error("invalid API base URL `{raw}`: {reason}")]
    InvalidBaseUrl { raw: String, reason: String },
}

/// Errors emitted by `HttpClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The backend answered with a non-success status.
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Option<Value>,
    },
    /// The backend rejected the bearer token; local credentials were cleared.
    #[error("session expired: {message}")]
    TokenExpired { message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// `true` when no response was received at all.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// Backend error code, when the server supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::TokenExpired { .. } => Some(codes::TOKEN_EXPIRED),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::TokenExpired { .. } => Some(401),
            _ => None,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::TokenExpired { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DictionaryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DictionaryError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by game session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Not enough vocabulary for the chosen filters.
    #[error("not enough words for this configuration: {0}")]
    InsufficientData(String),
    #[error("invalid game configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("session is not being played")]
    NotPlaying,
    #[error("session already started")]
    AlreadyStarted,
    #[error("session already completed")]
    Completed,
    #[error("session is not complete yet")]
    NotComplete,
    #[error("question is not the current question")]
    NotCurrent,
    #[error("question {0} has not been answered")]
    Unanswered(QuestionId),
    #[error("question already answered")]
    AlreadyAnswered,
    #[error("question does not belong to this session")]
    UnknownQuestion,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted when submitting an answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("question {0} already answered")]
    AlreadyAnswered(QuestionId),
    #[error("session is not being played")]
    NotPlaying,
    #[error("option {option_id} does not belong to question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[error("could not reach the server: {0}")]
    Connectivity(ApiError),
    #[error(transparent)]
    Api(ApiError),
    #[error("answer could not be recorded: {0}")]
    Failed(String),
    /// The server accepted an answer that does not fit the question on
    /// screen; local state no longer matches the server.
    #[error("server answer for question {question_id} was rejected locally: {reason}")]
    Diverged {
        question_id: QuestionId,
        reason: String,
    },
}

/// Shown for submission failures that are neither connectivity nor API errors.
pub const SUBMISSION_FAILED: &str = "Could not submit the answer. Please try again.";

impl SubmitError {
    /// Map a transport error into the submission taxonomy.
    #[must_use]
    pub fn from_api(err: ApiError) -> Self {
        if err.is_network() {
            return Self::Connectivity(err);
        }
        match err {
            ApiError::Api { ref code, .. } if code == codes::ANSWER_ALREADY_SUBMITTED => {
                Self::Failed(err.message())
            }
            ApiError::Api { .. } | ApiError::TokenExpired { .. } => Self::Api(err),
            // Decode, URL and storage failures carry internal detail.
            _ => Self::Failed(SUBMISSION_FAILED.into()),
        }
    }

    /// Text suitable for showing next to the answer buttons.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyAnswered(_) => "This question has already been answered.".into(),
            Self::NotPlaying => "The game is not running.".into(),
            Self::UnknownOption { .. } => "That option is not part of this question.".into(),
            Self::Connectivity(_) => {
                "Network error: please check your connection and try again.".into()
            }
            Self::Api(err) => err.message(),
            Self::Failed(message) => message.clone(),
            Self::Diverged { .. } => {
                "This game is out of sync with the server. Please start a new session.".into()
            }
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str) -> ApiError {
        ApiError::Api {
            status: 400,
            code: code.into(),
            message: "nope".into(),
            details: None,
        }
    }

    #[test]
    fn network_and_timeout_map_to_connectivity() {
        assert!(matches!(
            SubmitError::from_api(ApiError::Network("refused".into())),
            SubmitError::Connectivity(_)
        ));
        assert!(matches!(
            SubmitError::from_api(ApiError::Timeout(Duration::from_secs(30))),
            SubmitError::Connectivity(_)
        ));
    }

    #[test]
    fn duplicate_submission_is_a_failure_with_server_message() {
        let err = SubmitError::from_api(api(codes::ANSWER_ALREADY_SUBMITTED));
        assert_eq!(err.user_message(), "nope");
    }

    #[test]
    fn structured_errors_pass_through() {
        let err = SubmitError::from_api(api(codes::VALIDATION_ERROR));
        assert!(matches!(err, SubmitError::Api(ApiError::Api { .. })));
        assert_eq!(err.user_message(), "nope");

        let expired = SubmitError::from_api(ApiError::TokenExpired {
            message: "expired".into(),
        });
        assert!(matches!(expired, SubmitError::Api(ApiError::TokenExpired { .. })));
    }

    #[test]
    fn internal_failures_get_a_generic_message() {
        let decode = SubmitError::from_api(ApiError::Decode(
            "missing field `answered_at`".into(),
        ));
        assert!(matches!(decode, SubmitError::Failed(_)));
        assert_eq!(decode.user_message(), SUBMISSION_FAILED);

        let storage = SubmitError::from_api(ApiError::Storage(StorageError::Connection(
            "disk full".into(),
        )));
        assert_eq!(storage.user_message(), SUBMISSION_FAILED);
        assert_eq!(
            SubmitError::from_api(ApiError::InvalidUrl("bad".into())).user_message(),
            SUBMISSION_FAILED
        );
    }

    #[test]
    fn token_expired_reports_code_and_status() {
        let err = ApiError::TokenExpired {
            message: "expired".into(),
        };
        assert_eq!(err.code(), Some(codes::TOKEN_EXPIRED));
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_network());
    }
}
