//! # quiz-engine
//!
//! Quiz authoring and quiz-taking logic for the quiz web application:
//! a parser for the plain-text quiz format and the timed attempt session
//! that drives one user through a persisted quiz.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quiz_engine::{parse_quiz_text, ApiClient, AttemptRunner, QuizId, QuizLookup, Settings};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! // Authoring: text in, draft quiz out.
//! let draft = parse_quiz_text("Title: Maths\nQ1: 2+2?\nA) 3\nB) 4 *correct*\n")?;
//! assert!(draft.is_draft());
//!
//! // Taking: fetch a persisted quiz and run an attempt against the API.
//! let client = Arc::new(ApiClient::new(Settings::default().api_context()?));
//! let quiz = client.get_quiz(&QuizId::new("quiz-id")).await?;
//! let runner = AttemptRunner::start(quiz, &*client, client.clone()).await?;
//! let snapshot = runner.snapshot().await;
//! println!("{} left", snapshot.clock);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod data;
pub mod models;
mod parser;
pub mod protocol;
pub mod services;
pub mod session;

pub use config::Settings;
pub use data::{load_quiz, load_quiz_json, load_quiz_text, LoadError};
pub use models::{
    Difficulty, OptionId, PublishProblem, Question, QuestionId, Quiz, QuizId, QuizOption,
};
pub use parser::{parse_quiz_text, write_quiz_text, FormatError, CORRECT_MARKER};
pub use services::{
    ApiClient, ApiContext, CooldownService, QuizLookup, ServiceError, SubmissionService,
};
pub use session::{AttemptRunner, AttemptSession, Notice, Phase, SessionError, SessionSnapshot};
