use std::fmt::Write;

use crate::models::Quiz;

use super::CORRECT_MARKER;

const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Render a quiz in the plain-text format read by
/// [`parse_quiz_text`](super::parse_quiz_text).
///
/// Ids are not part of the format and are dropped. Questions are numbered
/// from 1; options past the fourth reuse the letters `A`-`D`, which the
/// parser accepts.
pub fn write_quiz_text(quiz: &Quiz) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Title: {}", quiz.title);
    let _ = writeln!(out, "Description: {}", quiz.description);
    let _ = writeln!(out, "Difficulty: {}", quiz.difficulty);
    let _ = writeln!(out, "Time: {}", quiz.time_limit_minutes);
    let _ = writeln!(out, "Topic: {}", quiz.topic_id);
    if !quiz.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", quiz.tags.join(", "));
    }

    for (i, question) in quiz.questions.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Q{}: {}", i + 1, question.text);

        for (j, option) in question.options.iter().enumerate() {
            let letter = OPTION_LETTERS[j % OPTION_LETTERS.len()];
            // The parser strips the first marker, so it goes ahead of the text.
            if option.is_correct {
                let _ = writeln!(out, "{}) {} {}", letter, CORRECT_MARKER, option.text);
            } else {
                let _ = writeln!(out, "{}) {}", letter, option.text);
            }
        }

        if !question.explanation.is_empty() {
            let _ = writeln!(out, "Explanation: {}", question.explanation);
        }
    }

    out
}
