use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use vocab_core::Clock;
use vocab_core::model::{GameSession, SessionConfigDraft, SessionId, SessionStatistics};

use super::api::{GameApi, PageRequest};
use super::play::PlaySession;
use crate::error::{ApiError, SessionError, codes};
use crate::http::Paginated;

/// Pause between answer feedback and the next question.
pub const FEEDBACK_DELAY: Duration = Duration::from_secs(1);

/// Creates, resumes, and drives game sessions against a `GameApi`.
#[derive(Clone)]
pub struct GameSessionService {
    api: Arc<dyn GameApi>,
    clock: Clock,
    feedback_delay: Duration,
}

impl GameSessionService {
    #[must_use]
    pub fn new(api: Arc<dyn GameApi>, clock: Clock) -> Self {
        Self {
            api,
            clock,
            feedback_delay: FEEDBACK_DELAY,
        }
    }

    #[must_use]
    pub fn with_feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay = delay;
        self
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    pub(crate) fn api(&self) -> &dyn GameApi {
        self.api.as_ref()
    }

    /// Validate `draft`, create the remote session, and load its questions.
    ///
    /// Nothing is sent when the draft is invalid.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` for local validation failures,
    /// `SessionError::InsufficientData` when the server lacks vocabulary for
    /// the filters, `SessionError::InvalidConfiguration` when it rejects them,
    /// and `SessionError::Api` for any other failure.
    pub async fn create(&self, draft: &SessionConfigDraft) -> Result<PlaySession, SessionError> {
        let config = draft.validate()?;
        let request = config.to_request();
        debug!(
            mode = %config.mode(),
            source_language_id = %config.source_language_id(),
            target_language_id = %config.target_language_id(),
            "creating game session"
        );

        let session = self
            .api
            .create_session(&request)
            .await
            .map_err(classify_create_error)?;
        if !session.id.is_valid() {
            return Err(SessionError::Api(ApiError::Decode(format!(
                "server returned invalid session id {}",
                session.id
            ))));
        }

        let payload = self.api.get_session(session.id).await?;
        let play = PlaySession::from_payload(payload, Some(config), self.clock.now())?;
        info!(
            session_id = %play.session_id(),
            questions = play.questions().len(),
            "game session created"
        );
        Ok(play)
    }

    /// Load an existing session for play.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the session cannot be fetched, or
    /// `SessionError::Question`/`SessionError::InsufficientData` for an
    /// unusable payload.
    pub async fn resume(&self, session_id: SessionId) -> Result<PlaySession, SessionError> {
        let payload = self.api.get_session(session_id).await?;
        PlaySession::from_payload(payload, None, self.clock.now())
    }

    /// Wait out the feedback delay, then move to the next question.
    ///
    /// Returns `Ok(None)` without waiting when the play-through is complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` from [`PlaySession::advance`], e.g. when the
    /// current question has not been answered.
    pub async fn advance_after_feedback(
        &self,
        play: &mut PlaySession,
    ) -> Result<Option<usize>, SessionError> {
        if play.is_complete() {
            return Ok(None);
        }
        if !play.can_advance() {
            // Fails fast with the reason; no delay for a refused step.
            play.advance(self.clock.now())?;
            return Ok(Some(play.current_index()));
        }
        tokio::time::sleep(self.feedback_delay).await;
        play.advance(self.clock.now())?;
        Ok(Some(play.current_index()))
    }

    /// Server-side statistics for a finished play-through.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` before completion, or
    /// `SessionError::Api` if the request fails.
    pub async fn statistics(&self, play: &PlaySession) -> Result<SessionStatistics, SessionError> {
        if !play.is_complete() {
            return Err(SessionError::NotComplete);
        }
        self.statistics_for(play.session_id()).await
    }

    /// Server-side statistics for any session id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails.
    pub async fn statistics_for(
        &self,
        session_id: SessionId,
    ) -> Result<SessionStatistics, SessionError> {
        Ok(self.api.session_statistics(session_id).await?)
    }

    /// Past sessions, newest first as ordered by the server.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails.
    pub async fn history(&self, page: PageRequest) -> Result<Paginated<GameSession>, SessionError> {
        Ok(self.api.list_sessions(page).await?)
    }
}

fn classify_create_error(err: ApiError) -> SessionError {
    match err.code() {
        Some(codes::INSUFFICIENT_WORDS) => {
            warn!(error = %err, "not enough vocabulary for configuration");
            SessionError::InsufficientData(err.message())
        }
        Some(codes::VALIDATION_ERROR | codes::INVALID_MODE | codes::INVALID_REQUEST) => {
            warn!(error = %err, "server rejected game configuration");
            SessionError::InvalidConfiguration(err.message())
        }
        _ => SessionError::Api(err),
    }
}
