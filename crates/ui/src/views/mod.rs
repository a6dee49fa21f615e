mod home;
mod participant;

pub use home::HomeView;
pub use participant::{
    AnswerSheet, JoinForm, NoticeBanner, ParticipantPage, QuestionCard, ResultsCard, TimerBar,
};

#[cfg(test)]
mod view_smoke;
