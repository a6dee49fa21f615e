use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, SessionId};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz session as reported by the backend.
///
/// Variants are declared in lifecycle order, so `Ord` can be used to keep
/// an observed status from moving backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// The host has not started the quiz yet.
    Waiting,
    /// Questions are open for answers.
    InProgress,
    /// No more answers are accepted.
    Finished,
}

impl SessionStatus {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question. Correctness never reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(alias = "text")]
    pub prompt: String,
    pub options: Vec<String>,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id: QuestionId::new(id),
            prompt: prompt.into(),
            options,
        }
    }

    #[must_use]
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Snapshot of a quiz session. The backend owns it; the client only caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Session {
    #[must_use]
    pub fn new(session_id: SessionId, status: SessionStatus, questions: Vec<Question>) -> Self {
        Self {
            session_id,
            status,
            questions,
        }
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_by_id(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
