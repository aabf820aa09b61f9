//! Plain-text quiz format.
//!
//! ```text
//! Title: JavaScript Basics
//! Description: Test your knowledge of JavaScript fundamentals
//! Difficulty: MEDIUM
//! Time: 30
//! Topic: javascript-basics
//! Tags: javascript, programming, basics
//!
//! Q1: What is the output of typeof null in JavaScript?
//! A) undefined
//! B) null
//! C) object *correct*
//! D) number
//! Explanation: typeof null returns "object".
//! ```
//!
//! The grammar is line oriented: every line is trimmed, blank lines are
//! skipped and unknown lines are ignored. The only hard rule is that each
//! question ends up with exactly one correct option.

mod error;
mod grammar;
mod writer;

pub use error::FormatError;
pub use grammar::parse_quiz_text;
pub use writer::write_quiz_text;

/// Marker that flags an option as the correct one.
pub const CORRECT_MARKER: &str = "*correct*";
