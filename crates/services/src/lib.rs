#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod game;
pub mod http;
pub mod reference;

pub use vocab_core::Clock;

pub use app_services::AppServices;
pub use auth::{AuthService, AuthSessionStore};
pub use config::ApiConfig;
pub use dictionary::{Debounced, DictionaryService, SearchDebouncer};
pub use error::{
    ApiError, AppServicesError, AuthError, ConfigLoadError, DictionaryError, SessionError,
    SubmitError,
};
pub use game::{
    GameApi, GamePhase, GameSessionService, HttpGameApi, PageRequest, PlaySession,
    SessionProgress, SessionSummary, SubmitOutcome,
};
pub use http::{HttpClient, Paginated, Pagination, RequestOptions};
pub use reference::{ReferenceService, TopicFilter};
