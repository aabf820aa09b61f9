#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_engine::protocol::{AttemptSubmission, CooldownStatus, SubmissionResult};
use quiz_engine::{
    parse_quiz_text, CooldownService, OptionId, QuestionId, Quiz, QuizId, QuizLookup,
    ServiceError, SubmissionService,
};

/// Parse `questions` two-option questions and give everything ids the way
/// the API would: `q{n}` for questions, `q{n}-o{m}` for options.
pub fn persisted_quiz(questions: usize, minutes: u32) -> Quiz {
    let mut text = format!("Title: Fixture\nTime: {}\nTopic: testing\n", minutes);
    for i in 1..=questions {
        text.push_str(&format!("Q{}: Question {}?\nA) right *correct*\nB) wrong\n", i, i));
    }

    let mut quiz = parse_quiz_text(&text).expect("fixture must parse");
    quiz.id = Some(QuizId::new("quiz-1"));
    for (i, question) in quiz.questions.iter_mut().enumerate() {
        question.id = Some(QuestionId::new(format!("q{}", i + 1)));
        for (j, option) in question.options.iter_mut().enumerate() {
            option.id = Some(OptionId::new(format!("q{}-o{}", i + 1, j + 1)));
        }
    }
    quiz
}

pub fn question(n: usize) -> QuestionId {
    QuestionId::new(format!("q{}", n))
}

pub fn option(question: usize, option: usize) -> OptionId {
    OptionId::new(format!("q{}-o{}", question, option))
}

/// Quiz lookup serving persisted quizzes from memory and recording every
/// id it was asked for.
#[derive(Clone, Default)]
pub struct StubQuizzes {
    quizzes: Arc<HashMap<QuizId, Quiz>>,
    requests: Arc<Mutex<Vec<QuizId>>>,
}

impl StubQuizzes {
    pub fn with(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        let quizzes = quizzes
            .into_iter()
            .map(|quiz| (quiz.id.clone().expect("stored quizzes have ids"), quiz))
            .collect();
        Self {
            quizzes: Arc::new(quizzes),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<QuizId> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizLookup for StubQuizzes {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, ServiceError> {
        self.requests.lock().unwrap().push(id.clone());
        self.quizzes
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("quiz {} not found", id)))
    }
}

/// Cooldown service answering with a fixed status, or failing.
pub struct StubCooldowns {
    status: Option<CooldownStatus>,
}

impl StubCooldowns {
    pub fn open() -> Self {
        Self {
            status: Some(CooldownStatus::open()),
        }
    }

    pub fn returning(status: CooldownStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn failing() -> Self {
        Self { status: None }
    }
}

#[async_trait]
impl CooldownService for StubCooldowns {
    async fn get_cooldown_status(
        &self,
        _quiz_id: &QuizId,
    ) -> Result<CooldownStatus, ServiceError> {
        self.status.clone().ok_or(ServiceError::Status {
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}

/// Scripted submission outcomes.
pub enum Reply {
    Scored(SubmissionResult),
    Cooldown(Option<chrono::DateTime<chrono::Utc>>),
    Unavailable,
}

/// Submission service that records every call and replays scripted
/// replies, optionally after a delay. Once the script runs out it scores
/// every answer as correct.
#[derive(Clone, Default)]
pub struct RecordingSubmissions {
    calls: Arc<Mutex<Vec<AttemptSubmission>>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    delay: Option<Duration>,
}

impl RecordingSubmissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn then(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<AttemptSubmission> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionService for RecordingSubmissions {
    async fn submit_attempt(
        &self,
        _quiz_id: &QuizId,
        submission: &AttemptSubmission,
    ) -> Result<SubmissionResult, ServiceError> {
        self.calls.lock().unwrap().push(submission.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Scored(result)) => Ok(result),
            Some(Reply::Cooldown(next_attempt_at)) => {
                Err(ServiceError::Cooldown { next_attempt_at })
            }
            Some(Reply::Unavailable) => Err(ServiceError::Status {
                status: 503,
                message: "try later".to_string(),
            }),
            None => Ok(SubmissionResult {
                score: 100.0,
                correct_answers: submission.answers.len() as u32,
            }),
        }
    }
}
