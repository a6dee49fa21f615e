use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ParticipantId, QuestionId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while validating a display name before joining.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("participant name is empty")]
    Empty,
}

//
// ─── NAME ─────────────────────────────────────────────────────────────────────
//

/// A trimmed, non-empty display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantName(String);

impl ParticipantName {
    /// Validate a raw name as typed by the user.
    ///
    /// # Errors
    ///
    /// Returns `NameError::Empty` if nothing remains after trimming.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//
// ─── ANSWER RECORD ────────────────────────────────────────────────────────────
//

/// Outcome of one answered question, mirrored from the backend's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected_option_index: usize,
    pub is_correct: bool,
}

//
// ─── PARTICIPANT ──────────────────────────────────────────────────────────────
//

/// One user's identity and progress within a session.
///
/// Records are append-only and unique per question; `record_answer` is the
/// only way to add one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    answers: Vec<AnswerRecord>,
}

impl Participant {
    #[must_use]
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            answers: Vec::new(),
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn has_answered(&self, question_id: &QuestionId) -> bool {
        self.answers.iter().any(|a| &a.question_id == question_id)
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    /// Append a record unless one already exists for the same question.
    ///
    /// Returns `true` when the record was appended.
    pub fn record_answer(&mut self, record: AnswerRecord) -> bool {
        if self.has_answered(&record.question_id) {
            return false;
        }
        self.answers.push(record);
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::new(question),
            selected_option_index: 0,
            is_correct: correct,
        }
    }

    #[test]
    fn name_is_trimmed() {
        let name = ParticipantName::parse("  Ada  ").unwrap();
        assert_eq!(name.as_str(), "Ada");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(ParticipantName::parse("   ").unwrap_err(), NameError::Empty);
        assert_eq!(ParticipantName::parse("").unwrap_err(), NameError::Empty);
    }

    #[test]
    fn record_answer_is_unique_per_question() {
        let mut p = Participant::new(ParticipantId::new("p1"), "Ada");
        assert!(p.record_answer(record("q1", true)));
        assert!(!p.record_answer(record("q1", false)));
        assert!(p.record_answer(record("q2", false)));

        assert_eq!(p.answers().len(), 2);
        assert_eq!(p.correct_count(), 1);
        assert!(p.has_answered(&QuestionId::new("q1")));
        assert!(!p.has_answered(&QuestionId::new("q3")));
    }

    #[test]
    fn participant_decodes_without_answers() {
        let p: Participant =
            serde_json::from_str(r#"{ "id": "p1", "name": "Ada", "score": 0 }"#).unwrap();
        assert!(p.answers().is_empty());
    }
}
