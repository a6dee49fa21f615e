use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Backend verdict for a single submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub is_correct: bool,
    /// Authoritative running score after this answer.
    pub score: u32,
}

/// One entry of a bulk answer sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: QuestionId,
    pub selected_option_index: usize,
}

/// Backend verdict for a bulk submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub score: u32,
}
