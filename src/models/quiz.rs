use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Question, QuizId};

/// Time limit used when a quiz text carries no `Time:` line.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;

/// A quiz document: metadata plus its ordered questions.
///
/// A freshly parsed quiz is a draft and has no `id`; quizzes fetched from
/// the API carry ids on the quiz, its questions and its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuizId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(rename = "timeLimit", default = "default_time_limit")]
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub topic_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_MINUTES
}

/// Quiz difficulty.
///
/// Unrecognised values are kept verbatim so that a draft can be parsed
/// before anyone decides what the author meant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Unrecognized(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Difficulty::Unrecognized(_))
    }
}

impl From<String> for Difficulty {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "EASY" => Difficulty::Easy,
            "MEDIUM" => Difficulty::Medium,
            "HARD" => Difficulty::Hard,
            _ => Difficulty::Unrecognized(raw),
        }
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reason a draft is not ready to be published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishProblem {
    #[error("Title is required")]
    MissingTitle,
    #[error("Difficulty must be one of EASY, MEDIUM or HARD (got `{0}`)")]
    UnknownDifficulty(String),
    #[error("Time limit must be at least one minute")]
    ZeroTimeLimit,
    #[error("Topic is required")]
    MissingTopic,
    #[error("Quiz has no questions")]
    NoQuestions,
    #[error("Question {0} needs an explanation")]
    MissingExplanation(usize),
}

impl Quiz {
    /// An empty draft carrying the default metadata.
    pub fn draft() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            difficulty: Difficulty::default(),
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            topic_id: String::new(),
            tags: Vec::new(),
            questions: Vec::new(),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    pub fn time_limit_seconds(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }

    /// Everything that blocks publishing this quiz, in document order.
    pub fn publish_problems(&self) -> Vec<PublishProblem> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push(PublishProblem::MissingTitle);
        }
        if !self.difficulty.is_recognized() {
            problems.push(PublishProblem::UnknownDifficulty(
                self.difficulty.as_str().to_string(),
            ));
        }
        if self.time_limit_minutes == 0 {
            problems.push(PublishProblem::ZeroTimeLimit);
        }
        if self.topic_id.trim().is_empty() {
            problems.push(PublishProblem::MissingTopic);
        }
        if self.questions.is_empty() {
            problems.push(PublishProblem::NoQuestions);
        }

        problems.extend(
            self.questions
                .iter()
                .enumerate()
                .filter(|(_, question)| question.explanation.trim().is_empty())
                .map(|(i, _)| PublishProblem::MissingExplanation(i + 1)),
        );

        problems
    }
}

impl Default for Quiz {
    fn default() -> Self {
        Self::draft()
    }
}
