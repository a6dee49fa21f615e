//! Answer-sheet flow: selections stay local until one bulk submission.

use std::collections::BTreeMap;

use quiz_core::model::{
    AnswerPayload, BulkOutcome, ParticipantId, QuestionId, Session, SessionId, SessionStatus,
};
use tracing::{debug, info, warn};

use super::machine::ParticipantSession;
use super::notice::Notice;
use crate::config::SubmitMode;
use crate::error::{BackendError, ParticipantError};

/// Bulk call to run against the backend, issued by `begin_submit_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub answers: Vec<AnswerPayload>,
}

impl ParticipantSession {
    #[must_use]
    pub fn selected_answers(&self) -> &BTreeMap<QuestionId, usize> {
        &self.selected
    }

    #[must_use]
    pub fn is_sheet_submitted(&self) -> bool {
        self.sheet_submitted
    }

    /// True while the answer sheet can still be edited. Running out of time
    /// locks it for good.
    #[must_use]
    pub fn can_select(&self) -> bool {
        self.mode == SubmitMode::Bulk
            && self.session.is_some()
            && self.participant.is_some()
            && self.status() == Some(SessionStatus::InProgress)
            && !self.sheet_submitted
            && !self.is_time_up()
    }

    /// Time is up and the sheet still has to reach the backend.
    ///
    /// Covers a participant who joined after expiry and a submission that
    /// failed after expiry. The caller answers with `begin_submit_all`.
    #[must_use]
    pub fn submission_due(&self) -> bool {
        self.mode == SubmitMode::Bulk
            && self.is_time_up()
            && self.session.is_some()
            && self.participant.is_some()
            && !self.sheet_submitted
            && !self.is_finished()
    }

    /// Remember a choice for `question_id`. Returns `false` if ignored.
    pub fn select_answer(&mut self, question_id: &QuestionId, option_index: usize) -> bool {
        if !self.can_select() {
            return false;
        }
        let known = self
            .session
            .as_ref()
            .and_then(|s| s.question_by_id(question_id))
            .is_some_and(|q| q.has_option(option_index));
        if !known {
            debug!(%question_id, option_index, "selection ignored");
            return false;
        }
        self.selected.insert(question_id.clone(), option_index);
        true
    }

    /// Freeze the sheet and build the bulk request.
    ///
    /// Returns `None` without a session or participant, when already
    /// submitted, or once the quiz has finished.
    pub fn begin_submit_all(&mut self) -> Option<BulkRequest> {
        if self.mode != SubmitMode::Bulk || self.sheet_submitted || self.is_finished() {
            return None;
        }
        let session = self.session.as_ref()?;
        let participant = self.participant.as_ref()?;

        let answers = session
            .questions
            .iter()
            .filter_map(|q| {
                self.selected.get(&q.id).map(|index| AnswerPayload {
                    question_id: q.id.clone(),
                    selected_option_index: *index,
                })
            })
            .collect();
        let request = BulkRequest {
            session_id: self.session_id.clone(),
            participant_id: participant.id.clone(),
            answers,
        };

        self.sheet_submitted = true;
        self.notice = None;
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.stop();
        }
        Some(request)
    }

    /// Apply the backend's verdict for a bulk submission.
    ///
    /// Success stores the score and finishes the quiz locally. Failure
    /// allows another submission; the sheet is editable again only while
    /// time remains.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::Backend` for a failed submission and
    /// `ParticipantError::Storage` if progress could not be persisted.
    pub fn finish_submit_all(
        &mut self,
        request: &BulkRequest,
        result: Result<BulkOutcome, BackendError>,
    ) -> Result<u32, ParticipantError> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "bulk submission failed");
                self.sheet_submitted = false;
                self.notice = Some(Notice::submit_failed());
                return Err(err.into());
            }
        };

        let mut saved = Ok(());
        if let Some(participant) = self
            .participant
            .as_mut()
            .filter(|p| p.id == request.participant_id)
        {
            participant.score = outcome.score;
            let persisted = self.store.save_participant(&self.session_id, participant);
            saved = self.persist_result(persisted);
        }

        let total = self.session.as_ref().map_or(0, Session::question_count);
        self.current_index = self.current_index.max(total);
        let persisted = self
            .store
            .save_question_index(&self.session_id, self.current_index);
        let advanced = self.persist_result(persisted);
        info!(
            session_id = %self.session_id,
            answers = request.answers.len(),
            score = outcome.score,
            "answer sheet submitted"
        );

        saved?;
        advanced?;
        Ok(outcome.score)
    }
}
