mod http;
mod memory;

use async_trait::async_trait;
use quiz_core::model::{
    AnswerOutcome, AnswerPayload, BulkOutcome, Participant, ParticipantId, Session, SessionId,
};

use crate::error::BackendError;

pub use http::HttpQuizBackend;
pub use memory::{InMemoryBackend, POINTS_PER_CORRECT};

/// Contract with the service that owns sessions, scoring and status.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Fetch the current snapshot of a session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown session id.
    async fn get_session(&self, session_id: &SessionId) -> Result<Session, BackendError>;

    /// Register a participant under `name`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Join` when the backend refuses the join.
    async fn join_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<Participant, BackendError>;

    /// Score one answer. Repeating a call for the same `question_index` must
    /// not score twice; that is the backend's job.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the submission is not accepted.
    async fn submit_answer(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        option_index: usize,
        question_index: usize,
    ) -> Result<AnswerOutcome, BackendError>;

    /// Score a whole answer sheet at once.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the submission is not accepted.
    async fn submit_all_answers(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        answers: &[AnswerPayload],
    ) -> Result<BulkOutcome, BackendError>;
}
