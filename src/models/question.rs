use serde::{Deserialize, Serialize};

use super::{OptionId, QuestionId};

/// A single multiple-choice question.
///
/// Exactly one option is expected to be correct. The parser enforces this
/// when a draft is produced; quizzes served for taking may omit the
/// correctness flags entirely, in which case every option reads as incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    pub text: String,
    pub options: Vec<QuizOption>,
    #[serde(default)]
    pub explanation: String,
}

/// One answer choice of a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OptionId>,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            options: Vec::new(),
            explanation: String::new(),
        }
    }

    /// Number of options flagged as correct.
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|option| option.is_correct).count()
    }

    /// The correct option, if exactly one is flagged.
    pub fn correct_option(&self) -> Option<&QuizOption> {
        match self.correct_count() {
            1 => self.options.iter().find(|option| option.is_correct),
            _ => None,
        }
    }

    /// Look up an option by its persisted id.
    pub fn option(&self, id: &OptionId) -> Option<&QuizOption> {
        self.options
            .iter()
            .find(|option| option.id.as_ref() == Some(id))
    }
}

impl QuizOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: None,
            text: text.into(),
            is_correct,
        }
    }
}
