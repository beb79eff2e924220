use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use vocab_core::model::{
    Answer, GameSession, Question, QuestionId, SessionConfig, SessionId, SessionWithQuestions,
};

use super::submission::AnswerTimer;
use super::summary::SessionSummary;
use crate::error::SessionError;

/// Where a play-through stands. There are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Questions loaded, nothing shown yet.
    Created,
    Playing { index: usize },
    Completed,
}

/// Aggregated view of play-through progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub current_index: usize,
    pub is_complete: bool,
}

//
// ─── PLAY SESSION ──────────────────────────────────────────────────────────────
//

/// In-memory play-through of one remote game session.
///
/// Questions are stepped through in order. Each accepts exactly one answer,
/// and the index only moves forward after the current question is answered.
pub struct PlaySession {
    session: GameSession,
    config: Option<SessionConfig>,
    questions: Vec<Question>,
    answers: HashMap<QuestionId, Answer>,
    phase: GamePhase,
    timer: Option<AnswerTimer>,
    loaded_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl PlaySession {
    /// Validate a session payload and wrap it for play.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Question` for malformed questions and
    /// `SessionError::InsufficientData` when there are none.
    pub(crate) fn from_payload(
        payload: SessionWithQuestions,
        config: Option<SessionConfig>,
        loaded_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let SessionWithQuestions { session, questions } = payload.validate()?;
        if questions.is_empty() {
            return Err(SessionError::InsufficientData(format!(
                "session {} has no questions",
                session.id
            )));
        }
        Ok(Self {
            session,
            config,
            questions,
            answers: HashMap::new(),
            phase: GamePhase::Created,
            timer: None,
            loaded_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session.id
    }

    /// The validated configuration, when this play-through was created
    /// locally rather than resumed.
    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == GamePhase::Completed
    }

    /// Show the first question and start its timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` or `SessionError::Completed`
    /// outside `Created`.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<&Question, SessionError> {
        match self.phase {
            GamePhase::Created => {}
            GamePhase::Playing { .. } => return Err(SessionError::AlreadyStarted),
            GamePhase::Completed => return Err(SessionError::Completed),
        }
        self.phase = GamePhase::Playing { index: 0 };
        self.timer = Some(AnswerTimer::start(now));
        self.questions.first().ok_or(SessionError::Completed)
    }

    /// Zero-based position; stays on the last question once completed.
    #[must_use]
    pub fn current_index(&self) -> usize {
        match self.phase {
            GamePhase::Created => 0,
            GamePhase::Playing { index } => index,
            GamePhase::Completed => self.questions.len().saturating_sub(1),
        }
    }

    /// The question on screen while playing.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            GamePhase::Playing { index } => self.questions.get(index),
            GamePhase::Created | GamePhase::Completed => None,
        }
    }

    /// The question most recently shown: the current one while playing, the
    /// last one once completed.
    pub(crate) fn shown_question(&self) -> Option<&Question> {
        match self.phase {
            GamePhase::Created => None,
            GamePhase::Playing { .. } | GamePhase::Completed => {
                self.questions.get(self.current_index())
            }
        }
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    #[must_use]
    pub fn answer_for(&self, id: QuestionId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    /// Recorded answers in question order.
    #[must_use]
    pub fn answers(&self) -> Vec<&Answer> {
        self.questions
            .iter()
            .filter_map(|question| self.answers.get(&question.id))
            .collect()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub(crate) fn timer(&self) -> Option<&AnswerTimer> {
        self.timer.as_ref()
    }

    /// Store the server's answer for the current question.
    ///
    /// Enters `Completed` exactly when every question has an answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPlaying` before `begin`,
    /// `SessionError::Completed` afterwards, `SessionError::UnknownQuestion`
    /// for answers from another session, `SessionError::NotCurrent` for any
    /// question but the current one, and `SessionError::AlreadyAnswered` if
    /// it already has an answer.
    pub fn record_answer(
        &mut self,
        answer: Answer,
        now: DateTime<Utc>,
    ) -> Result<&Answer, SessionError> {
        let index = match self.phase {
            GamePhase::Playing { index } => index,
            GamePhase::Created => return Err(SessionError::NotPlaying),
            GamePhase::Completed => return Err(SessionError::Completed),
        };
        if answer.session_id != self.session.id || self.question(answer.question_id).is_none() {
            return Err(SessionError::UnknownQuestion);
        }
        if self.questions[index].id != answer.question_id {
            return Err(SessionError::NotCurrent);
        }
        if self.answers.contains_key(&answer.question_id) {
            return Err(SessionError::AlreadyAnswered);
        }

        let question_id = answer.question_id;
        self.answers.insert(question_id, answer);
        if self.answers.len() == self.questions.len() {
            self.phase = GamePhase::Completed;
            self.completed_at = Some(now);
            self.timer = None;
        }
        self.answers.get(&question_id).ok_or(SessionError::UnknownQuestion)
    }

    /// `true` when the current question is answered and another follows.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        match self.phase {
            GamePhase::Playing { index } => {
                index + 1 < self.questions.len()
                    && self.answers.contains_key(&self.questions[index].id)
            }
            GamePhase::Created | GamePhase::Completed => false,
        }
    }

    /// Move to the next question and restart the response timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unanswered` if the current question has no
    /// answer, `SessionError::NotPlaying` before `begin`, and
    /// `SessionError::Completed` once finished.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<&Question, SessionError> {
        let index = match self.phase {
            GamePhase::Playing { index } => index,
            GamePhase::Created => return Err(SessionError::NotPlaying),
            GamePhase::Completed => return Err(SessionError::Completed),
        };
        let current = &self.questions[index];
        if !self.answers.contains_key(&current.id) {
            return Err(SessionError::Unanswered(current.id));
        }
        let next = index + 1;
        if next >= self.questions.len() {
            return Err(SessionError::Completed);
        }
        self.phase = GamePhase::Playing { index: next };
        self.timer = Some(AnswerTimer::start(now));
        Ok(&self.questions[next])
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.answers.len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            current_index: self.current_index(),
            is_complete: self.is_complete(),
        }
    }

    /// Local results for a finished play-through.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` until every question is answered.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::NotComplete);
        }
        Ok(SessionSummary::from_answers(
            self.questions.len(),
            self.answers.values(),
        ))
    }
}

impl fmt::Debug for PlaySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaySession")
            .field("session_id", &self.session.id)
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("phase", &self.phase)
            .field("loaded_at", &self.loaded_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
