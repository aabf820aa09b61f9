//! Remote collaborators of the attempt session.
//!
//! The session only talks to these traits; [`ApiClient`] implements them
//! over HTTP, tests substitute in-memory doubles.

mod api;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Quiz, QuizId};
use crate::protocol::{AttemptSubmission, CooldownStatus, SubmissionResult};

pub use api::{ApiClient, ApiContext};

/// Failure talking to the quiz API.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The attempt was refused because the user is in cooldown.
    #[error("attempt refused: quiz is in cooldown")]
    Cooldown {
        next_attempt_at: Option<DateTime<Utc>>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API base URL `{0}`")]
    InvalidBaseUrl(String),
}

/// Fetch quizzes by id.
#[async_trait]
pub trait QuizLookup: Send + Sync {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, ServiceError>;
}

/// Ask whether the current user may attempt a quiz.
#[async_trait]
pub trait CooldownService: Send + Sync {
    async fn get_cooldown_status(&self, quiz_id: &QuizId) -> Result<CooldownStatus, ServiceError>;
}

/// Hand a finished attempt to the scoring service.
#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Fails with [`ServiceError::Cooldown`] when the server refuses the
    /// attempt for rate-limiting reasons.
    async fn submit_attempt(
        &self,
        quiz_id: &QuizId,
        submission: &AttemptSubmission,
    ) -> Result<SubmissionResult, ServiceError>;
}
