#![forbid(unsafe_code)]

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod participant;
pub mod scheduler;

pub use backend::{HttpQuizBackend, InMemoryBackend, QuizBackend};
pub use client::{Intent, ParticipantHandle, QuizClient};
pub use config::{ClientConfig, SubmitMode};
pub use error::{BackendError, ClientError, LogError, ParticipantError};
pub use logging::init_logging;

pub use participant::{
    AnswerFeedback, BulkRequest, Notice, NoticeKind, ParticipantPhase, ParticipantSession,
    ParticipantView, QuestionView, QuizProgress, TimerView,
};
