/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    pub remaining: usize,
    pub is_finished: bool,
}
