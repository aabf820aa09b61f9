use tracing::debug;

use crate::models::{Difficulty, Question, Quiz, QuizOption};

use super::{FormatError, CORRECT_MARKER};

/// Parse a plain-text quiz into a draft [`Quiz`].
///
/// Metadata lines may appear anywhere; a later line overrides an earlier
/// one. Options and explanations attach to the most recent `Q<n>:` line.
pub fn parse_quiz_text(text: &str) -> Result<Quiz, FormatError> {
    let mut quiz = Quiz::draft();
    let mut open: Option<Question> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;

        if let Some(rest) = line.strip_prefix("Title:") {
            quiz.title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Description:") {
            quiz.description = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Difficulty:") {
            quiz.difficulty = Difficulty::from(rest.trim().to_uppercase());
        } else if let Some(rest) = line.strip_prefix("Time:") {
            quiz.time_limit_minutes = parse_minutes(rest.trim(), line_no)?;
        } else if let Some(rest) = line.strip_prefix("Topic:") {
            quiz.topic_id = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Tags:") {
            quiz.tags = rest.split(',').map(|tag| tag.trim().to_string()).collect();
        } else if let Some(rest) = question_marker(line) {
            if let Some(done) = open.take() {
                quiz.questions.push(done);
            }
            open = Some(Question::new(rest.trim()));
        } else if let Some(rest) = option_marker(line) {
            let question = open
                .as_mut()
                .ok_or(FormatError::OrphanOption { line: line_no })?;
            question.options.push(parse_option(rest));
        } else if let Some(rest) = line.strip_prefix("Explanation:") {
            let question = open
                .as_mut()
                .ok_or(FormatError::OrphanExplanation { line: line_no })?;
            question.explanation = rest.trim().to_string();
        }
    }

    if let Some(done) = open.take() {
        quiz.questions.push(done);
    }

    validate_questions(&quiz.questions)?;

    debug!(
        title = %quiz.title,
        questions = quiz.questions.len(),
        "parsed quiz text"
    );
    Ok(quiz)
}

/// `Q<digits>:` followed by the question text.
fn question_marker(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('Q')?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    rest[digits..].strip_prefix(':')
}

/// `A)` through `D)` followed by the option text.
fn option_marker(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some('A'..='D'), Some(')')) => Some(chars.as_str()),
        _ => None,
    }
}

fn parse_option(rest: &str) -> QuizOption {
    let is_correct = rest.contains(CORRECT_MARKER);
    let text = rest.replacen(CORRECT_MARKER, "", 1);
    QuizOption::new(text.trim(), is_correct)
}

/// Leading digits of the value, so `30 (minutes)` reads as 30.
fn parse_minutes(value: &str, line: usize) -> Result<u32, FormatError> {
    let digits: &str = &value[..value.bytes().take_while(u8::is_ascii_digit).count()];
    match digits.parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(FormatError::InvalidTimeLimit {
            line,
            value: value.to_string(),
        }),
    }
}

fn validate_questions(questions: &[Question]) -> Result<(), FormatError> {
    for (index, question) in questions.iter().enumerate() {
        let number = index + 1;

        let found = question.correct_count();
        if found != 1 {
            return Err(FormatError::CorrectAnswerCount {
                question: number,
                found,
            });
        }
        if question.options.len() < 2 {
            return Err(FormatError::TooFewOptions {
                question: number,
                found: question.options.len(),
            });
        }
        if question.text.is_empty() {
            return Err(FormatError::MissingQuestionText { question: number });
        }
    }
    Ok(())
}
