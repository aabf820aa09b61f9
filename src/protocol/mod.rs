//! Wire shapes exchanged with the quiz API.

mod messages;

pub use messages::{
    AnswerSubmission, AttemptSubmission, AttemptSummary, CooldownRejection, CooldownStatus,
    SubmissionResult,
};
