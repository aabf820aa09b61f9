//! Quiz document model shared by the parser and the attempt session.

mod ids;
mod question;
mod quiz;

pub use ids::{OptionId, QuestionId, QuizId};
pub use question::{Question, QuizOption};
pub use quiz::{Difficulty, PublishProblem, Quiz, DEFAULT_TIME_LIMIT_MINUTES};
