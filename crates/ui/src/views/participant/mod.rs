mod components;
mod page;

pub use components::{AnswerSheet, JoinForm, NoticeBanner, QuestionCard, ResultsCard, TimerBar};
pub use page::ParticipantPage;
