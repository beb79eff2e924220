//! Vocabulary game sessions: creation, play-through, answers, results.

mod api;
mod play;
mod service;
mod submission;
mod summary;

pub use api::{DEFAULT_PAGE_SIZE, GameApi, HttpGameApi, MAX_PAGE_SIZE, PageRequest};
pub use play::{GamePhase, PlaySession, SessionProgress};
pub use service::{FEEDBACK_DELAY, GameSessionService};
pub use submission::{AnswerTimer, SubmitOutcome};
pub use summary::SessionSummary;
