mod answer;
mod ids;
mod participant;
mod session;

pub use ids::{ParticipantId, QuestionId, SessionId};

pub use answer::{AnswerOutcome, AnswerPayload, BulkOutcome};
pub use participant::{AnswerRecord, NameError, Participant, ParticipantName};
pub use session::{Question, Session, SessionStatus};
