use chrono::{DateTime, Utc};
use tracing::{info, warn};

use vocab_core::Clock;
use vocab_core::model::{Answer, OptionId, SubmitAnswerRequest};

use super::play::{PlaySession, SessionProgress};
use super::service::GameSessionService;
use crate::error::SubmitError;

/// Start instant of the question currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerTimer {
    started_at: DateTime<Utc>,
}

impl AnswerTimer {
    #[must_use]
    pub fn start(now: DateTime<Utc>) -> Self {
        Self { started_at: now }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole milliseconds since start; zero if the clock went backwards.
    #[must_use]
    pub fn elapsed_ms(&self, clock: &Clock) -> u64 {
        clock.elapsed_ms_since(self.started_at)
    }
}

/// Result of one accepted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub answer: Answer,
    pub is_complete: bool,
    pub progress: SessionProgress,
}

impl GameSessionService {
    /// Submit the player's choice for the question on screen.
    ///
    /// A question that already has an answer is rejected locally without a
    /// request. Failures are never retried.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::NotPlaying` before the session is started,
    /// `SubmitError::AlreadyAnswered` for a repeat selection,
    /// `SubmitError::UnknownOption` for an option from another question,
    /// the mapped transport error if the request fails, and
    /// `SubmitError::Diverged` if the server's answer cannot be stored locally.
    /// A diverged play-through cannot be continued.
    pub async fn submit(
        &self,
        play: &mut PlaySession,
        option_id: OptionId,
    ) -> Result<SubmitOutcome, SubmitError> {
        let question = play.shown_question().ok_or(SubmitError::NotPlaying)?;
        let question_id = question.id;
        if play.answer_for(question_id).is_some() {
            return Err(SubmitError::AlreadyAnswered(question_id));
        }
        if question.option(option_id).is_none() {
            return Err(SubmitError::UnknownOption {
                question_id,
                option_id,
            });
        }
        let timer = play.timer().ok_or(SubmitError::NotPlaying)?;

        let request = SubmitAnswerRequest {
            question_id,
            selected_option_id: option_id,
            response_time_ms: timer.elapsed_ms(self.clock()),
        };
        let session_id = play.session_id();
        let answer = match self.api().submit_answer(session_id, &request).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(%session_id, %question_id, error = %err, "answer submission failed");
                return Err(SubmitError::from_api(err));
            }
        };
        info!(
            %session_id,
            %question_id,
            is_correct = answer.is_correct,
            response_time_ms = request.response_time_ms,
            "answer recorded"
        );

        let (answer_session_id, answer_question_id) = (answer.session_id, answer.question_id);
        let answer = match play.record_answer(answer, self.clock().now()) {
            Ok(answer) => answer.clone(),
            Err(err) => {
                // The server has stored this answer, so a retry would be refused.
                warn!(
                    %session_id,
                    %question_id,
                    %answer_session_id,
                    %answer_question_id,
                    error = %err,
                    "server answer does not match the shown question"
                );
                return Err(SubmitError::Diverged {
                    question_id,
                    reason: err.to_string(),
                });
            }
        };
        Ok(SubmitOutcome {
            answer,
            is_complete: play.is_complete(),
            progress: play.progress(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::time::{fixed_now, manual_clock};

    #[test]
    fn elapsed_follows_the_clock() {
        let clock = manual_clock();
        let timer = AnswerTimer::start(clock.now());
        clock.advance_ms(1200);
        assert_eq!(timer.elapsed_ms(&clock), 1200);
    }

    #[test]
    fn negative_skew_saturates_to_zero() {
        let clock = manual_clock();
        let timer = AnswerTimer::start(fixed_now() + chrono::Duration::seconds(5));
        assert_eq!(timer.elapsed_ms(&clock), 0);
    }
}
