//! Quiz attempt sessions.
//!
//! [`AttemptSession`] is the synchronous state machine: it never reads a
//! clock or touches the network, callers hand it the current time.
//! [`AttemptRunner`] owns one session behind a single-writer lock and drives
//! it from tokio: the one-second countdown, the cooldown wake-up and the
//! calls to the submission service.

mod clock;
mod runner;
mod state;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{OptionId, QuestionId};
use crate::services::ServiceError;

pub use clock::{format_clock, format_wait, TimerBand};
pub use runner::AttemptRunner;
pub use state::{AttemptSession, Phase, SessionSnapshot, SubmitTrigger, Tick};

/// Shown when a submission fails for any reason other than cooldown.
pub const RETRY_MESSAGE: &str = "Failed to submit quiz. Please try again.";

/// Failure of a session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A local precondition was not met; the message is meant for the user.
    #[error("{0}")]
    Validation(String),

    /// The user may not submit an attempt until `next_attempt_at`.
    #[error("{}", cooldown_message(.next_attempt_at, Utc::now()))]
    Cooldown {
        next_attempt_at: Option<DateTime<Utc>>,
    },

    /// The submission service failed; answers are kept for a retry.
    #[error("Failed to submit quiz. Please try again.")]
    Transport(#[source] ServiceError),

    /// The quiz cannot back a session (missing ids, no questions...).
    #[error("quiz cannot be taken: {0}")]
    InvalidQuiz(String),

    #[error("question `{question}` has no option `{option}`")]
    UnknownSelection {
        question: QuestionId,
        option: OptionId,
    },

    #[error("a submission is already in progress")]
    SubmissionInFlight,

    #[error("the attempt session has ended")]
    Closed,
}

/// Message currently surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Validation(String),
    Cooldown {
        next_attempt_at: Option<DateTime<Utc>>,
    },
    Retry,
}

impl Notice {
    pub fn message(&self, now: DateTime<Utc>) -> String {
        match self {
            Notice::Validation(message) => message.clone(),
            Notice::Cooldown { next_attempt_at } => cooldown_message(next_attempt_at, now),
            Notice::Retry => RETRY_MESSAGE.to_string(),
        }
    }
}

fn cooldown_message(next_attempt_at: &Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match next_attempt_at.and_then(|at| format_wait(at - now)) {
        Some(wait) => format!("Quiz is in cooldown. Next attempt allowed in: {}", wait),
        None => "Quiz is in cooldown.".to_string(),
    }
}
