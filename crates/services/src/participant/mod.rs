mod bulk;
mod countdown;
mod machine;
mod notice;
mod progress;
mod view;

// Public API of the participant subsystem.
pub use crate::error::ParticipantError;
pub use bulk::BulkRequest;
pub use countdown::{Countdown, CountdownTick};
pub use machine::{AnswerFeedback, AnswerRequest, JoinRequest, ParticipantPhase, ParticipantSession};
pub use notice::{Notice, NoticeKind};
pub use progress::QuizProgress;
pub use view::{ParticipantView, QuestionView, TimerView};
