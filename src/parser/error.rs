use thiserror::Error;

/// Structural problem in a plain-text quiz.
///
/// Question numbers are 1-based positions in the parsed output, not the
/// digits the author wrote after `Q`. Line numbers are 1-based positions in
/// the input, blank lines included.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Question {question} must have exactly one correct answer.")]
    CorrectAnswerCount { question: usize, found: usize },

    #[error("Question {question} must have at least two options.")]
    TooFewOptions { question: usize, found: usize },

    #[error("Question {question} has no text.")]
    MissingQuestionText { question: usize },

    #[error("Line {line}: time limit must be a positive number of minutes (got `{value}`).")]
    InvalidTimeLimit { line: usize, value: String },

    #[error("Line {line}: option appears before any question.")]
    OrphanOption { line: usize },

    #[error("Line {line}: explanation appears before any question.")]
    OrphanExplanation { line: usize },
}

impl FormatError {
    /// The 1-based question this error refers to, when it is about one.
    pub fn question(&self) -> Option<usize> {
        match self {
            FormatError::CorrectAnswerCount { question, .. }
            | FormatError::TooFewOptions { question, .. }
            | FormatError::MissingQuestionText { question } => Some(*question),
            _ => None,
        }
    }

    /// The 1-based input line this error refers to, when it is about one.
    pub fn line(&self) -> Option<usize> {
        match self {
            FormatError::InvalidTimeLimit { line, .. }
            | FormatError::OrphanOption { line }
            | FormatError::OrphanExplanation { line } => Some(*line),
            _ => None,
        }
    }
}
