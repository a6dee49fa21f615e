use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use quiz_core::model::{
    AnswerOutcome, AnswerPayload, BulkOutcome, Participant, ParticipantId, Question, Session,
    SessionId, SessionStatus,
};

use super::QuizBackend;
use crate::error::BackendError;

pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(Debug, Clone)]
struct ParticipantEntry {
    name: String,
    score: u32,
    // question index -> was correct
    scored: HashMap<usize, bool>,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    session: Session,
    answer_key: Vec<usize>,
    participants: HashMap<ParticipantId, ParticipantEntry>,
}

#[derive(Debug, Default)]
struct State {
    sessions: HashMap<SessionId, SessionEntry>,
    next_participant: u64,
    fail_fetches: u32,
    fail_joins: u32,
    fail_submits: u32,
    fetch_calls: usize,
    submit_calls: usize,
}

/// Scriptable in-process backend for tests and the demo mode.
///
/// Clones share state, so a test can keep one clone to steer the session
/// while the client under test talks to another.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A three-question session `demo`, already in progress.
    #[must_use]
    pub fn demo() -> Self {
        let backend = Self::new();
        let questions = vec![
            Question::new(
                "q1",
                "Which keyword declares an immutable binding in Rust?",
                vec!["var".into(), "let".into(), "const fn".into(), "mut".into()],
            ),
            Question::new(
                "q2",
                "What does `?` do on a `Result`?",
                vec![
                    "Panics on error".into(),
                    "Ignores the error".into(),
                    "Returns the error early".into(),
                ],
            ),
            Question::new(
                "q3",
                "Which type is shared, reference-counted and thread-safe?",
                vec!["Rc".into(), "Arc".into(), "Box".into(), "Cell".into()],
            ),
        ];
        backend.insert_session(
            Session::new(SessionId::new("demo"), SessionStatus::InProgress, questions),
            vec![1, 2, 1],
        );
        backend
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Rejected("backend state poisoned".into()))
    }

    /// Register a session together with the index of each question's correct option.
    pub fn insert_session(&self, session: Session, answer_key: Vec<usize>) {
        if let Ok(mut state) = self.lock() {
            state.sessions.insert(
                session.session_id.clone(),
                SessionEntry {
                    session,
                    answer_key,
                    participants: HashMap::new(),
                },
            );
        }
    }

    pub fn set_status(&self, session_id: &SessionId, status: SessionStatus) {
        if let Ok(mut state) = self.lock() {
            if let Some(entry) = state.sessions.get_mut(session_id) {
                entry.session.status = status;
            }
        }
    }

    /// Make the next `count` fetches fail with a transport-style error.
    pub fn fail_next_fetches(&self, count: u32) {
        if let Ok(mut state) = self.lock() {
            state.fail_fetches = count;
        }
    }

    pub fn fail_next_joins(&self, count: u32) {
        if let Ok(mut state) = self.lock() {
            state.fail_joins = count;
        }
    }

    pub fn fail_next_submits(&self, count: u32) {
        if let Ok(mut state) = self.lock() {
            state.fail_submits = count;
        }
    }

    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.lock().map(|state| state.fetch_calls).unwrap_or_default()
    }

    #[must_use]
    pub fn submit_calls(&self) -> usize {
        self.lock().map(|state| state.submit_calls).unwrap_or_default()
    }

    /// Authoritative score for a participant, if known.
    #[must_use]
    pub fn score_of(&self, session_id: &SessionId, participant_id: &ParticipantId) -> Option<u32> {
        let state = self.lock().ok()?;
        state
            .sessions
            .get(session_id)?
            .participants
            .get(participant_id)
            .map(|p| p.score)
    }
}

fn take_failure(counter: &mut u32) -> bool {
    if *counter == 0 {
        return false;
    }
    *counter -= 1;
    true
}

fn score_one(entry: &mut ParticipantEntry, question_index: usize, correct: bool) -> bool {
    if let Some(previous) = entry.scored.get(&question_index) {
        return *previous;
    }
    entry.scored.insert(question_index, correct);
    if correct {
        entry.score = entry.score.saturating_add(POINTS_PER_CORRECT);
    }
    correct
}

#[async_trait]
impl QuizBackend for InMemoryBackend {
    async fn get_session(&self, session_id: &SessionId) -> Result<Session, BackendError> {
        let mut state = self.lock()?;
        state.fetch_calls += 1;
        if take_failure(&mut state.fail_fetches) {
            return Err(BackendError::Rejected("fetch failed".into()));
        }
        state
            .sessions
            .get(session_id)
            .map(|entry| entry.session.clone())
            .ok_or(BackendError::NotFound)
    }

    async fn join_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<Participant, BackendError> {
        let mut state = self.lock()?;
        if take_failure(&mut state.fail_joins) {
            return Err(BackendError::Join("join failed".into()));
        }
        state.next_participant += 1;
        let id = ParticipantId::new(format!("p{}", state.next_participant));

        let entry = state
            .sessions
            .get_mut(session_id)
            .ok_or(BackendError::NotFound)?;
        if entry.session.status.is_finished() {
            return Err(BackendError::Join("session already finished".into()));
        }
        entry.participants.insert(
            id.clone(),
            ParticipantEntry {
                name: name.to_owned(),
                score: 0,
                scored: HashMap::new(),
            },
        );
        debug!(%session_id, participant_id = %id, "participant joined");
        Ok(Participant::new(id, name))
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        option_index: usize,
        question_index: usize,
    ) -> Result<AnswerOutcome, BackendError> {
        let mut state = self.lock()?;
        state.submit_calls += 1;
        if take_failure(&mut state.fail_submits) {
            return Err(BackendError::Rejected("submit failed".into()));
        }

        let entry = state
            .sessions
            .get_mut(session_id)
            .ok_or(BackendError::NotFound)?;
        if entry.session.status != SessionStatus::InProgress {
            return Err(BackendError::Rejected("session is not accepting answers".into()));
        }
        let expected = *entry
            .answer_key
            .get(question_index)
            .ok_or_else(|| BackendError::Rejected(format!("no question {question_index}")))?;
        let participant = entry
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| BackendError::Rejected("unknown participant".into()))?;

        let is_correct = score_one(participant, question_index, expected == option_index);
        debug!(
            %session_id,
            participant = %participant.name,
            question_index,
            is_correct,
            "answer scored"
        );
        Ok(AnswerOutcome {
            is_correct,
            score: participant.score,
        })
    }

    async fn submit_all_answers(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        answers: &[AnswerPayload],
    ) -> Result<BulkOutcome, BackendError> {
        let mut state = self.lock()?;
        state.submit_calls += 1;
        if take_failure(&mut state.fail_submits) {
            return Err(BackendError::Rejected("submit failed".into()));
        }

        let entry = state
            .sessions
            .get_mut(session_id)
            .ok_or(BackendError::NotFound)?;
        let positions: Vec<(usize, bool)> = answers
            .iter()
            .filter_map(|answer| {
                let index = entry
                    .session
                    .questions
                    .iter()
                    .position(|q| q.id == answer.question_id)?;
                let expected = entry.answer_key.get(index)?;
                Some((index, *expected == answer.selected_option_index))
            })
            .collect();
        let participant = entry
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| BackendError::Rejected("unknown participant".into()))?;

        for (index, correct) in positions {
            score_one(participant, index, correct);
        }
        Ok(BulkOutcome {
            score: participant.score,
        })
    }
}
