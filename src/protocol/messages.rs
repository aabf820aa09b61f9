//! Request and response bodies of the quiz API.
//!
//! All bodies are JSON with camelCase keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{OptionId, QuestionId};

/// Whether the current user may attempt a quiz right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownStatus {
    pub can_attempt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl CooldownStatus {
    pub fn open() -> Self {
        Self {
            can_attempt: true,
            next_attempt_at: None,
        }
    }

    pub fn blocked_until(next_attempt_at: Option<DateTime<Utc>>) -> Self {
        Self {
            can_attempt: false,
            next_attempt_at,
        }
    }
}

/// One answered question in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub selected_option_id: OptionId,
}

/// Body of `POST /quizzes/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSubmission {
    /// Answers in question order; unanswered questions are left out.
    pub answers: Vec<AnswerSubmission>,
    #[serde(rename = "timeSpent")]
    pub time_spent_seconds: u64,
}

/// Scoring outcome reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub score: f64,
    pub correct_answers: u32,
}

/// Body of the 403 response sent when an attempt is refused for cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownRejection {
    pub next_attempt_at: DateTime<Utc>,
}

/// What the results view shows after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: usize,
    #[serde(rename = "timeSpent")]
    pub time_spent_seconds: u64,
}

impl AttemptSummary {
    pub fn new(result: SubmissionResult, total_questions: usize, time_spent_seconds: u64) -> Self {
        Self {
            score: result.score,
            correct_answers: result.correct_answers,
            total_questions,
            time_spent_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_serialization() {
        let submission = AttemptSubmission {
            answers: vec![AnswerSubmission {
                question_id: QuestionId::new("q1"),
                selected_option_id: OptionId::new("o2"),
            }],
            time_spent_seconds: 42,
        };
        let json = serde_json::to_string(&submission).unwrap();
        assert!(json.contains("\"questionId\":\"q1\""));
        assert!(json.contains("\"selectedOptionId\":\"o2\""));
        assert!(json.contains("\"timeSpent\":42"));
    }

    #[test]
    fn test_cooldown_status_deserialization() {
        let status: CooldownStatus = serde_json::from_str(r#"{"canAttempt":true}"#).unwrap();
        assert_eq!(status, CooldownStatus::open());

        let status: CooldownStatus =
            serde_json::from_str(r#"{"canAttempt":false,"nextAttemptAt":"2026-03-01T12:00:00Z"}"#)
                .unwrap();
        assert!(!status.can_attempt);
        assert_eq!(
            status.next_attempt_at.map(|at| at.to_rfc3339()),
            Some("2026-03-01T12:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_result_accepts_integer_score() {
        let result: SubmissionResult =
            serde_json::from_str(r#"{"score":80,"correctAnswers":4}"#).unwrap();
        assert_eq!(result.score, 80.0);
        assert_eq!(result.correct_answers, 4);
    }
}
