use std::collections::BTreeMap;

use quiz_core::model::{AnswerRecord, Question, QuestionId, SessionId};

use super::machine::{ParticipantPhase, ParticipantSession};
use super::notice::Notice;
use super::progress::QuizProgress;
use crate::config::SubmitMode;

/// The question currently offered for answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerView {
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub percent: f64,
    pub running: bool,
}

/// Owned, render-ready copy of a `ParticipantSession`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub session_id: SessionId,
    pub mode: SubmitMode,
    pub phase: ParticipantPhase,
    pub participant_name: Option<String>,
    pub score: u32,
    pub answers: Vec<AnswerRecord>,
    pub question: Option<QuestionView>,
    pub questions: Vec<Question>,
    pub selected: BTreeMap<QuestionId, usize>,
    pub progress: QuizProgress,
    pub can_answer: bool,
    pub can_select: bool,
    pub joining: bool,
    pub submitting: bool,
    pub sheet_submitted: bool,
    pub notice: Option<Notice>,
    pub timer: Option<TimerView>,
}

impl ParticipantView {
    /// Blank view of `session_id`: nothing fetched, nobody joined.
    ///
    /// A starting point for building views by hand; the session task
    /// publishes `ParticipantSession::view` instead.
    #[must_use]
    pub fn pending(session_id: SessionId, mode: SubmitMode) -> Self {
        Self {
            session_id,
            mode,
            phase: ParticipantPhase::Joining,
            participant_name: None,
            score: 0,
            answers: Vec::new(),
            question: None,
            questions: Vec::new(),
            selected: BTreeMap::new(),
            progress: QuizProgress::default(),
            can_answer: false,
            can_select: false,
            joining: false,
            submitting: false,
            sheet_submitted: false,
            notice: None,
            timer: None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == ParticipantPhase::Finished
    }
}

impl ParticipantSession {
    #[must_use]
    pub fn view(&self) -> ParticipantView {
        let participant = self.participant();
        ParticipantView {
            session_id: self.session_id().clone(),
            mode: self.mode(),
            phase: self.phase(),
            participant_name: participant.map(|p| p.name.clone()),
            score: participant.map_or(0, |p| p.score),
            answers: participant.map(|p| p.answers().to_vec()).unwrap_or_default(),
            question: self.current_question().map(|q| QuestionView {
                index: self.current_index(),
                id: q.id.clone(),
                prompt: q.prompt.clone(),
                options: q.options.clone(),
            }),
            questions: self
                .session()
                .map(|s| s.questions.clone())
                .unwrap_or_default(),
            selected: self.selected_answers().clone(),
            progress: self.progress(),
            can_answer: self.can_answer(),
            can_select: self.can_select(),
            joining: self.is_joining(),
            submitting: self.is_submitting(),
            sheet_submitted: self.is_sheet_submitted(),
            notice: self.notice().cloned(),
            timer: self.countdown().map(|c| TimerView {
                remaining_secs: c.remaining_secs(),
                total_secs: c.total_secs(),
                percent: c.progress_percent(),
                running: c.is_running(),
            }),
        }
    }
}
