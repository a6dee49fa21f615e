use std::collections::BTreeMap;

use quiz_core::model::{
    AnswerOutcome, AnswerRecord, Participant, ParticipantId, ParticipantName, Question, QuestionId,
    Session, SessionId, SessionStatus,
};
use storage::ProgressStore;
use tracing::{debug, info, warn};

use super::countdown::{Countdown, CountdownTick};
use super::notice::{Notice, NoticeKind};
use super::progress::QuizProgress;
use crate::config::SubmitMode;
use crate::error::{BackendError, ParticipantError};

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Where the participant stands, derived from session, participant and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantPhase {
    Joining,
    WaitingForStart,
    Answering(usize),
    /// A submission is in flight.
    Advancing,
    Finished,
}

//
// ─── REQUESTS ──────────────────────────────────────────────────────────────────
//

/// Join call to run against the backend, issued by `begin_join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub session_id: SessionId,
    pub name: String,
}

/// Answer call to run against the backend, issued by `begin_submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub question_id: QuestionId,
    pub question_index: usize,
    pub option_index: usize,
}

/// What the participant learns once an answer is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub score: u32,
    pub finished: bool,
}

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// Participant-side progression through one quiz session.
///
/// Reconciles polled snapshots, locally persisted progress and the countdown.
/// Network calls are split into `begin_*` / `finish_*` pairs: `begin_*`
/// checks the gate and raises the in-flight flag, `finish_*` applies the
/// backend's answer. Every change to the participant or to the question
/// index is written to the `ProgressStore` before the call returns.
pub struct ParticipantSession {
    pub(super) session_id: SessionId,
    pub(super) mode: SubmitMode,
    pub(super) store: ProgressStore,
    pub(super) session: Option<Session>,
    pub(super) participant: Option<Participant>,
    pub(super) current_index: usize,
    observed_status: Option<SessionStatus>,
    joining: bool,
    submitting: bool,
    pub(super) notice: Option<Notice>,
    pub(super) countdown: Option<Countdown>,
    pub(super) selected: BTreeMap<QuestionId, usize>,
    pub(super) sheet_submitted: bool,
}

impl ParticipantSession {
    /// Fresh machine with nothing cached.
    #[must_use]
    pub fn new(session_id: SessionId, store: ProgressStore) -> Self {
        Self {
            session_id,
            mode: SubmitMode::PerQuestion,
            store,
            session: None,
            participant: None,
            current_index: 0,
            observed_status: None,
            joining: false,
            submitting: false,
            notice: None,
            countdown: None,
            selected: BTreeMap::new(),
            sheet_submitted: false,
        }
    }

    /// Rebuild the machine from what the store holds for `session_id`.
    #[must_use]
    pub fn restore(session_id: SessionId, store: ProgressStore) -> Self {
        let local = store.load(&session_id);
        debug!(
            %session_id,
            has_participant = local.participant.is_some(),
            question_index = local.question_index,
            "restored local progress"
        );
        let mut machine = Self::new(session_id, store);
        machine.participant = local.participant;
        machine.current_index = local.question_index;
        machine
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SubmitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable the whole-quiz countdown. `None` or zero leaves it off.
    #[must_use]
    pub fn with_time_limit(mut self, total_secs: Option<u32>) -> Self {
        self.countdown = total_secs.filter(|secs| *secs > 0).map(Countdown::new);
        self
    }

    // ─── accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn is_joining(&self) -> bool {
        self.joining
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    #[must_use]
    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    #[must_use]
    pub fn countdown_running(&self) -> bool {
        self.countdown.is_some_and(|c| c.is_running())
    }

    /// The whole-quiz budget has run out.
    #[must_use]
    pub fn is_time_up(&self) -> bool {
        self.countdown.is_some_and(|c| c.is_expired())
    }

    /// Locally observed status.
    ///
    /// Reaching the end of the question list means `Finished` whatever the
    /// backend says; otherwise the furthest status any snapshot reported.
    /// A waiting session with no questions yet is still waiting.
    #[must_use]
    pub fn status(&self) -> Option<SessionStatus> {
        let session = self.session.as_ref()?;
        let count = session.question_count();
        let waiting_for_questions =
            count == 0 && self.observed_status == Some(SessionStatus::Waiting);
        if self.current_index >= count && !waiting_for_questions {
            return Some(SessionStatus::Finished);
        }
        self.observed_status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status() == Some(SessionStatus::Finished)
    }

    #[must_use]
    pub fn phase(&self) -> ParticipantPhase {
        if self.participant.is_none() {
            return ParticipantPhase::Joining;
        }
        match self.status() {
            None | Some(SessionStatus::Waiting) => ParticipantPhase::WaitingForStart,
            Some(SessionStatus::Finished) => ParticipantPhase::Finished,
            Some(SessionStatus::InProgress) => {
                if self.submitting || self.sheet_submitted {
                    ParticipantPhase::Advancing
                } else {
                    ParticipantPhase::Answering(self.current_index)
                }
            }
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.session.as_ref().map_or(0, Session::question_count);
        QuizProgress {
            total,
            answered: self.participant.as_ref().map_or(0, |p| p.answers().len()),
            current_index: self.current_index,
            remaining: total.saturating_sub(self.current_index),
            is_finished: self.is_finished(),
        }
    }

    // ─── queries ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref()?.question(self.current_index)
    }

    #[must_use]
    pub fn has_answered_current(&self) -> bool {
        match (self.participant.as_ref(), self.current_question()) {
            (Some(participant), Some(question)) => participant.has_answered(&question.id),
            _ => false,
        }
    }

    /// The single gate every answer affordance honours.
    #[must_use]
    pub fn can_answer(&self) -> bool {
        self.session.is_some()
            && self.participant.is_some()
            && self.status() == Some(SessionStatus::InProgress)
            && self.current_question().is_some()
            && !self.has_answered_current()
    }

    // ─── snapshots ────────────────────────────────────────────────────────────

    /// Apply a polled snapshot. Safe to call with stale or repeated snapshots:
    /// the question index never moves backwards and the observed status
    /// never regresses.
    pub fn refresh(&mut self, snapshot: Session) {
        if snapshot.session_id != self.session_id {
            warn!(
                expected = %self.session_id,
                got = %snapshot.session_id,
                "ignoring snapshot for another session"
            );
            return;
        }

        let reported = snapshot.status;
        self.observed_status = Some(self.observed_status.map_or(reported, |s| s.max(reported)));
        self.session = Some(snapshot);
        if self.notice.as_ref().is_some_and(|n| n.kind == NoticeKind::Fetch) {
            self.notice = None;
        }

        if let Err(err) = self.skip_answered() {
            warn!(session_id = %self.session_id, error = %err, "could not persist skip");
        }
        self.sync_countdown();
    }

    /// Record a failed poll. Polling goes on; the next success clears it.
    pub fn fetch_failed(&mut self, err: &BackendError) {
        warn!(session_id = %self.session_id, error = %err, "session fetch failed");
        self.notice = Some(Notice::fetch_failed(err));
    }

    // Moves past questions the cached participant already answered, e.g.
    // when a reload happened between persisting the answer and the index.
    fn skip_answered(&mut self) -> Result<(), ParticipantError> {
        while !self.is_finished() && self.has_answered_current() {
            debug!(
                session_id = %self.session_id,
                question_index = self.current_index,
                "skipping already answered question"
            );
            self.next_question()?;
        }
        Ok(())
    }

    fn sync_countdown(&mut self) {
        let status = self.status();
        let sheet_submitted = self.sheet_submitted;
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        match status {
            Some(SessionStatus::InProgress) if !sheet_submitted && !countdown.has_started() => {
                countdown.start();
                debug!(total_secs = countdown.total_secs(), "countdown started");
            }
            Some(SessionStatus::Finished) if countdown.is_running() => {
                countdown.stop();
                debug!("countdown stopped");
            }
            _ => {}
        }
    }

    // ─── join ─────────────────────────────────────────────────────────────────

    /// Validate the name and raise the loading flag.
    ///
    /// Returns `Ok(None)` when a join is already in flight or the participant
    /// has already joined.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::Validation` for a blank name; nothing else
    /// changes apart from the notice.
    pub fn begin_join(&mut self, raw_name: &str) -> Result<Option<JoinRequest>, ParticipantError> {
        if self.joining || self.participant.is_some() {
            debug!(session_id = %self.session_id, "join ignored");
            return Ok(None);
        }
        let name = match ParticipantName::parse(raw_name) {
            Ok(name) => name,
            Err(err) => {
                self.notice = Some(Notice::empty_name());
                return Err(err.into());
            }
        };

        self.joining = true;
        self.notice = None;
        Ok(Some(JoinRequest {
            session_id: self.session_id.clone(),
            name: name.as_str().to_owned(),
        }))
    }

    /// Apply the backend's reply to a join.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::Backend` if the join failed, or
    /// `ParticipantError::Storage` if the participant could not be persisted
    /// (it is still kept in memory).
    pub fn finish_join(
        &mut self,
        result: Result<Participant, BackendError>,
    ) -> Result<(), ParticipantError> {
        self.joining = false;
        let participant = match result {
            Ok(participant) => participant,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "join failed");
                self.notice = Some(Notice::join_failed());
                return Err(err.into());
            }
        };

        info!(
            session_id = %self.session_id,
            participant_id = %participant.id,
            "joined session"
        );
        let persisted = self
            .store
            .save_participant(&self.session_id, &participant)
            .and_then(|()| {
                self.store
                    .save_question_index(&self.session_id, self.current_index)
            });
        self.participant = Some(participant);
        self.persist_result(persisted)?;
        self.sync_countdown();
        Ok(())
    }

    // ─── per-question answers ─────────────────────────────────────────────────

    /// Check the gate and raise the submitting flag.
    ///
    /// Returns `Ok(None)` when answering is not possible right now or another
    /// submission is in flight.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::InvalidOption` if the current question has
    /// no option at `option_index`.
    pub fn begin_submit(
        &mut self,
        option_index: usize,
    ) -> Result<Option<AnswerRequest>, ParticipantError> {
        if self.mode != SubmitMode::PerQuestion || self.submitting || !self.can_answer() {
            debug!(
                session_id = %self.session_id,
                submitting = self.submitting,
                "submit ignored"
            );
            return Ok(None);
        }
        let (Some(question), Some(participant)) =
            (self.current_question(), self.participant.as_ref())
        else {
            return Ok(None);
        };
        if !question.has_option(option_index) {
            self.notice = Some(Notice::invalid_option());
            return Err(ParticipantError::InvalidOption {
                index: option_index,
            });
        }

        let request = AnswerRequest {
            session_id: self.session_id.clone(),
            participant_id: participant.id.clone(),
            question_id: question.id.clone(),
            question_index: self.current_index,
            option_index,
        };
        self.submitting = true;
        self.notice = None;
        Ok(Some(request))
    }

    /// Apply the backend's verdict for `request`.
    ///
    /// On success the answer is recorded once, the score replaced with the
    /// backend's value, and the quiz advanced if it still sits on the
    /// answered question. On failure only the submitting flag is cleared.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::Backend` for a failed submission and
    /// `ParticipantError::Storage` if progress could not be persisted.
    pub fn finish_submit(
        &mut self,
        request: &AnswerRequest,
        result: Result<AnswerOutcome, BackendError>,
    ) -> Result<AnswerFeedback, ParticipantError> {
        self.submitting = false;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    session_id = %self.session_id,
                    question_index = request.question_index,
                    error = %err,
                    "answer submission failed"
                );
                self.notice = Some(Notice::submit_failed());
                return Err(err.into());
            }
        };

        let Some(participant) = self
            .participant
            .as_mut()
            .filter(|p| p.id == request.participant_id)
        else {
            warn!(session_id = %self.session_id, "acknowledgement for unknown participant");
            return Ok(AnswerFeedback {
                is_correct: outcome.is_correct,
                score: outcome.score,
                finished: self.is_finished(),
            });
        };

        let appended = participant.record_answer(AnswerRecord {
            question_id: request.question_id.clone(),
            selected_option_index: request.option_index,
            is_correct: outcome.is_correct,
        });
        participant.score = outcome.score;
        debug!(
            session_id = %self.session_id,
            question_index = request.question_index,
            is_correct = outcome.is_correct,
            score = outcome.score,
            appended,
            "answer acknowledged"
        );

        let persisted = self.store.save_participant(&self.session_id, participant);
        let saved = self.persist_result(persisted);

        let advanced = if self.current_index == request.question_index {
            self.next_question()
        } else {
            Ok(())
        };

        saved?;
        advanced?;
        Ok(AnswerFeedback {
            is_correct: outcome.is_correct,
            score: outcome.score,
            finished: self.is_finished(),
        })
    }

    /// Advance to the next question, or one past the last one to finish.
    /// No-op once finished.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantError::Storage` if the new index cannot be persisted.
    pub fn next_question(&mut self) -> Result<(), ParticipantError> {
        if self.is_finished() {
            return Ok(());
        }
        let Some(total) = self.session.as_ref().map(Session::question_count) else {
            return Ok(());
        };

        if self.current_index + 1 >= total {
            self.current_index = total;
            if let Some(countdown) = self.countdown.as_mut() {
                countdown.stop();
            }
            info!(session_id = %self.session_id, "reached the end of the quiz");
        } else {
            self.current_index += 1;
        }

        let persisted = self
            .store
            .save_question_index(&self.session_id, self.current_index);
        self.persist_result(persisted)
    }

    // ─── countdown ────────────────────────────────────────────────────────────

    /// Advance the countdown by one second.
    ///
    /// In per-question mode expiry finishes the quiz locally. In bulk mode the
    /// sheet locks and `submission_due` stays true until a bulk submission
    /// goes through.
    pub fn tick_countdown(&mut self) -> CountdownTick {
        let Some(countdown) = self.countdown.as_mut() else {
            return CountdownTick::Idle;
        };
        let tick = countdown.tick();
        if tick == CountdownTick::Expired && self.mode == SubmitMode::PerQuestion {
            if let Err(err) = self.expire() {
                warn!(session_id = %self.session_id, error = %err, "could not persist expiry");
            }
        }
        tick
    }

    fn expire(&mut self) -> Result<(), ParticipantError> {
        let Some(total) = self.session.as_ref().map(Session::question_count) else {
            return Ok(());
        };
        if self.current_index >= total {
            return Ok(());
        }
        info!(session_id = %self.session_id, "time is up");
        self.current_index = total;
        let persisted = self.store.save_question_index(&self.session_id, total);
        self.persist_result(persisted)
    }

    pub(super) fn persist_result(
        &mut self,
        result: Result<(), storage::StorageError>,
    ) -> Result<(), ParticipantError> {
        result.map_err(|err| {
            warn!(session_id = %self.session_id, error = %err, "failed to persist progress");
            self.notice = Some(Notice::storage_failed());
            ParticipantError::Storage(err)
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
