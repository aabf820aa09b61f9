//! Attempt session state machine.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::{OptionId, Question, QuestionId, Quiz, QuizId};
use crate::protocol::{
    AnswerSubmission, AttemptSubmission, AttemptSummary, CooldownStatus, SubmissionResult,
};
use crate::services::ServiceError;

use super::clock::{format_clock, TimerBand};
use super::{Notice, SessionError};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The user is barred from submitting until the cooldown lifts.
    CoolingDown,
    /// Answering questions.
    InProgress,
    /// A submission is in flight.
    Submitting,
    /// The attempt was scored.
    Submitted,
    /// The owner went away; nothing more happens.
    TornDown,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Submitted | Phase::TornDown)
    }
}

/// Who asked for the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The user pressed submit; every question must be answered.
    Manual,
    /// The countdown ran out; partial answers are accepted.
    Timeout,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown is paused because the session is not in progress.
    Paused,
    /// Seconds left after this tick.
    Remaining(u64),
    /// The countdown just hit zero; submit with [`SubmitTrigger::Timeout`].
    Expired,
    /// The session is over; stop ticking.
    Finished,
}

/// One user's pass through a persisted quiz.
#[derive(Debug)]
pub struct AttemptSession {
    quiz: Quiz,
    quiz_id: QuizId,
    phase: Phase,
    current_index: usize,
    selected: HashMap<QuestionId, OptionId>,
    remaining_seconds: u64,
    started_at: Instant,
    cooldown: Option<CooldownStatus>,
    notice: Option<Notice>,
    expired: bool,
    time_spent_seconds: u64,
    summary: Option<AttemptSummary>,
}

/// Read-only view of a session for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub current_index: usize,
    pub total_questions: usize,
    pub question: Question,
    pub selected_option: Option<OptionId>,
    pub answered: usize,
    pub remaining_seconds: u64,
    pub clock: String,
    pub band: TimerBand,
    pub progress_percent: f64,
    pub notice: Option<Notice>,
    pub cooldown: Option<CooldownStatus>,
    pub summary: Option<AttemptSummary>,
}

impl AttemptSession {
    /// Start a session on a persisted quiz.
    ///
    /// The quiz must have an id, at least one question, unique question ids
    /// and an id on every option.
    pub fn new(quiz: Quiz, started_at: Instant) -> Result<Self, SessionError> {
        let quiz_id = quiz
            .id
            .clone()
            .ok_or_else(|| SessionError::InvalidQuiz("quiz has not been saved".to_string()))?;
        check_takeable(&quiz)?;

        Ok(Self {
            remaining_seconds: quiz.time_limit_seconds(),
            quiz,
            quiz_id,
            phase: Phase::InProgress,
            current_index: 0,
            selected: HashMap::new(),
            started_at,
            cooldown: None,
            notice: None,
            expired: false,
            time_spent_seconds: 0,
            summary: None,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions[self.current_index]
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn cooldown(&self) -> Option<&CooldownStatus> {
        self.cooldown.as_ref()
    }

    pub fn summary(&self) -> Option<&AttemptSummary> {
        self.summary.as_ref()
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    pub fn selection(&self, question: &QuestionId) -> Option<&OptionId> {
        self.selected.get(question)
    }

    pub fn answered_count(&self) -> usize {
        self.selected.len()
    }

    /// Record the server's cooldown verdict.
    ///
    /// A verdict whose resume time has already passed is ignored.
    pub fn apply_cooldown(&mut self, status: CooldownStatus, now: DateTime<Utc>) {
        if self.phase.is_terminal() {
            return;
        }
        let lifted = status.can_attempt || status.next_attempt_at.is_some_and(|at| at <= now);
        if lifted {
            self.lift_cooldown();
            return;
        }

        self.notice = Some(Notice::Cooldown {
            next_attempt_at: status.next_attempt_at,
        });
        self.cooldown = Some(status);
        self.phase = Phase::CoolingDown;
    }

    /// End the cooldown, if any.
    pub fn lift_cooldown(&mut self) {
        self.cooldown = None;
        if matches!(self.notice, Some(Notice::Cooldown { .. })) {
            self.notice = None;
        }
        if self.phase == Phase::CoolingDown {
            self.phase = Phase::InProgress;
        }
    }

    /// How long until the current cooldown lifts, when it has a resume time.
    pub fn pending_wakeup(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.phase != Phase::CoolingDown {
            return None;
        }
        let at = self.cooldown.as_ref()?.next_attempt_at?;
        Some((at - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Record (or replace) the answer to a question.
    pub fn select_option(
        &mut self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<(), SessionError> {
        if self.phase.is_terminal() {
            return Err(SessionError::Closed);
        }
        let known = self
            .quiz
            .questions
            .iter()
            .find(|q| q.id.as_ref() == Some(&question))
            .is_some_and(|q| q.option(&option).is_some());
        if !known {
            return Err(SessionError::UnknownSelection { question, option });
        }

        self.selected.insert(question, option);
        self.notice = None;
        Ok(())
    }

    /// Move to the next question once the current one is answered.
    ///
    /// Stays on the last question when already there.
    pub fn go_next(&mut self) -> Result<usize, SessionError> {
        if self.phase.is_terminal() {
            return Err(SessionError::Closed);
        }
        if !self.is_answered(self.current_index) {
            return Err(self.reject("Please select an answer before proceeding"));
        }

        self.notice = None;
        if self.current_index + 1 < self.quiz.questions.len() {
            self.current_index += 1;
        }
        Ok(self.current_index)
    }

    pub fn go_previous(&mut self) -> usize {
        self.current_index = self.current_index.saturating_sub(1);
        self.current_index
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        match self.phase {
            Phase::Submitted | Phase::TornDown => return Tick::Finished,
            Phase::CoolingDown | Phase::Submitting => return Tick::Paused,
            Phase::InProgress => {}
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 && !self.expired {
            self.expired = true;
            return Tick::Expired;
        }
        Tick::Remaining(self.remaining_seconds)
    }

    /// Check the preconditions and build the submission body.
    ///
    /// Moves the session to [`Phase::Submitting`]; the outcome must be fed
    /// back through [`complete_submission`](Self::complete_submission).
    pub fn begin_submission(
        &mut self,
        trigger: SubmitTrigger,
        now: Instant,
    ) -> Result<AttemptSubmission, SessionError> {
        match self.phase {
            Phase::Submitted | Phase::TornDown => return Err(SessionError::Closed),
            Phase::Submitting => return Err(SessionError::SubmissionInFlight),
            Phase::CoolingDown => {
                let next_attempt_at = self.cooldown.as_ref().and_then(|c| c.next_attempt_at);
                self.notice = Some(Notice::Cooldown { next_attempt_at });
                return Err(SessionError::Cooldown { next_attempt_at });
            }
            Phase::InProgress => {}
        }

        let partial_allowed = trigger == SubmitTrigger::Timeout || self.expired;
        if !partial_allowed {
            if !self.is_answered(self.current_index) {
                return Err(self.reject("Please select an answer before submitting"));
            }
            let unanswered = self.quiz.questions.len() - self.selected.len();
            if unanswered > 0 {
                return Err(self.reject(format!(
                    "Please answer all questions ({} remaining)",
                    unanswered
                )));
            }
        }

        let answers = self
            .quiz
            .questions
            .iter()
            .filter_map(|question| {
                let question_id = question.id.clone()?;
                let selected_option_id = self.selected.get(&question_id)?.clone();
                Some(AnswerSubmission {
                    question_id,
                    selected_option_id,
                })
            })
            .collect();

        self.time_spent_seconds = now.saturating_duration_since(self.started_at).as_secs();
        self.phase = Phase::Submitting;
        self.notice = None;

        Ok(AttemptSubmission {
            answers,
            time_spent_seconds: self.time_spent_seconds,
        })
    }

    /// Apply the submission service's answer.
    ///
    /// Returns [`SessionError::Closed`] without touching anything when the
    /// session was torn down while the call was in flight.
    pub fn complete_submission(
        &mut self,
        outcome: Result<SubmissionResult, ServiceError>,
        now: DateTime<Utc>,
    ) -> Result<AttemptSummary, SessionError> {
        if self.phase != Phase::Submitting {
            return Err(SessionError::Closed);
        }

        match outcome {
            Ok(result) => {
                let summary = AttemptSummary::new(
                    result,
                    self.quiz.questions.len(),
                    self.time_spent_seconds,
                );
                self.summary = Some(summary.clone());
                self.phase = Phase::Submitted;
                Ok(summary)
            }
            Err(ServiceError::Cooldown { next_attempt_at }) => {
                self.phase = Phase::InProgress;
                self.apply_cooldown(CooldownStatus::blocked_until(next_attempt_at), now);
                // Surface the refusal even when the resume time already passed.
                self.notice = Some(Notice::Cooldown { next_attempt_at });
                Err(SessionError::Cooldown { next_attempt_at })
            }
            Err(err) => {
                self.phase = Phase::InProgress;
                self.notice = Some(Notice::Retry);
                Err(SessionError::Transport(err))
            }
        }
    }

    pub fn teardown(&mut self) {
        self.phase = Phase::TornDown;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let question = self.current_question().clone();
        let selected_option = question
            .id
            .as_ref()
            .and_then(|id| self.selected.get(id))
            .cloned();
        let total_questions = self.quiz.questions.len();

        SessionSnapshot {
            phase: self.phase,
            current_index: self.current_index,
            total_questions,
            question,
            selected_option,
            answered: self.selected.len(),
            remaining_seconds: self.remaining_seconds,
            clock: format_clock(self.remaining_seconds),
            band: TimerBand::for_remaining(self.remaining_seconds),
            progress_percent: (self.current_index + 1) as f64 / total_questions as f64 * 100.0,
            notice: self.notice.clone(),
            cooldown: self.cooldown.clone(),
            summary: self.summary.clone(),
        }
    }

    fn is_answered(&self, index: usize) -> bool {
        self.quiz.questions[index]
            .id
            .as_ref()
            .is_some_and(|id| self.selected.contains_key(id))
    }

    fn reject(&mut self, message: impl Into<String>) -> SessionError {
        let message = message.into();
        self.notice = Some(Notice::Validation(message.clone()));
        SessionError::Validation(message)
    }
}

fn check_takeable(quiz: &Quiz) -> Result<(), SessionError> {
    if quiz.questions.is_empty() {
        return Err(SessionError::InvalidQuiz("quiz has no questions".to_string()));
    }

    let mut seen = HashSet::new();
    for (i, question) in quiz.questions.iter().enumerate() {
        let id = question
            .id
            .as_ref()
            .ok_or_else(|| SessionError::InvalidQuiz(format!("question {} has no id", i + 1)))?;
        if !seen.insert(id) {
            return Err(SessionError::InvalidQuiz(format!(
                "question id `{}` is used more than once",
                id
            )));
        }
        if question.options.iter().any(|option| option.id.is_none()) {
            return Err(SessionError::InvalidQuiz(format!(
                "question {} has an option without an id",
                i + 1
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::models::QuizOption;

    fn quiz(questions: usize, minutes: u32) -> Quiz {
        let questions = (1..=questions)
            .map(|i| {
                let mut question = Question::new(format!("Question {}", i));
                question.id = Some(QuestionId::new(format!("q{}", i)));
                question.options = (1..=2)
                    .map(|j| QuizOption {
                        id: Some(OptionId::new(format!("q{}-o{}", i, j))),
                        text: format!("option {}", j),
                        is_correct: j == 1,
                    })
                    .collect();
                question
            })
            .collect();

        Quiz {
            id: Some(QuizId::new("quiz")),
            title: "Sample".to_string(),
            time_limit_minutes: minutes,
            questions,
            ..Quiz::draft()
        }
    }

    fn session(questions: usize) -> AttemptSession {
        AttemptSession::new(quiz(questions, 1), Instant::now()).unwrap()
    }

    fn answer(session: &mut AttemptSession, i: usize) {
        session
            .select_option(
                QuestionId::new(format!("q{}", i)),
                OptionId::new(format!("q{}-o1", i)),
            )
            .unwrap();
    }

    fn ok_result() -> Result<SubmissionResult, ServiceError> {
        Ok(SubmissionResult {
            score: 100.0,
            correct_answers: 2,
        })
    }

    #[test]
    fn test_new_session_defaults() {
        let session = session(3);
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining_seconds(), 60);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.quiz_id().as_str(), "quiz");
    }

    #[test]
    fn test_rejects_untakeable_quizzes() {
        let mut draft = quiz(1, 1);
        draft.id = None;
        assert!(matches!(
            AttemptSession::new(draft, Instant::now()),
            Err(SessionError::InvalidQuiz(_))
        ));

        let empty = quiz(0, 1);
        assert!(matches!(
            AttemptSession::new(empty, Instant::now()),
            Err(SessionError::InvalidQuiz(_))
        ));

        let mut duplicate = quiz(2, 1);
        duplicate.questions[1].id = duplicate.questions[0].id.clone();
        assert!(matches!(
            AttemptSession::new(duplicate, Instant::now()),
            Err(SessionError::InvalidQuiz(_))
        ));

        let mut missing_option_id = quiz(1, 1);
        missing_option_id.questions[0].options[1].id = None;
        assert!(matches!(
            AttemptSession::new(missing_option_id, Instant::now()),
            Err(SessionError::InvalidQuiz(_))
        ));
    }

    #[test]
    fn test_select_option_overwrites_and_clears_notice() {
        let mut session = session(2);
        assert!(session.go_next().is_err());
        assert!(session.notice().is_some());

        answer(&mut session, 1);
        assert!(session.notice().is_none());

        session
            .select_option(QuestionId::new("q1"), OptionId::new("q1-o2"))
            .unwrap();
        assert_eq!(session.answered_count(), 1);
        assert_eq!(
            session.selection(&QuestionId::new("q1")),
            Some(&OptionId::new("q1-o2"))
        );
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_select_unknown_option() {
        let mut session = session(2);
        let err = session
            .select_option(QuestionId::new("q1"), OptionId::new("q2-o1"))
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownSelection { .. }));
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn test_go_next_requires_answer() {
        let mut session = session(3);
        let err = session.go_next().unwrap_err();
        assert_eq!(err.to_string(), "Please select an answer before proceeding");
        assert_eq!(
            session.notice(),
            Some(&Notice::Validation(
                "Please select an answer before proceeding".to_string()
            ))
        );
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut session = session(2);
        assert_eq!(session.go_previous(), 0);

        answer(&mut session, 1);
        assert_eq!(session.go_next().unwrap(), 1);
        answer(&mut session, 2);
        assert_eq!(session.go_next().unwrap(), 1);

        assert_eq!(session.go_previous(), 0);
        assert_eq!(session.go_previous(), 0);
        // Going forward again over answered questions never fails.
        assert_eq!(session.go_next().unwrap(), 1);
    }

    #[test]
    fn test_manual_submit_requires_every_answer() {
        let mut session = session(3);
        answer(&mut session, 1);

        let err = session
            .begin_submission(SubmitTrigger::Manual, Instant::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Please answer all questions (2 remaining)");
        assert_eq!(session.phase(), Phase::InProgress);

        session.go_next().unwrap();
        let err = session
            .begin_submission(SubmitTrigger::Manual, Instant::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Please select an answer before submitting");
    }

    #[test]
    fn test_submission_in_question_order() {
        let start = Instant::now();
        let mut session = AttemptSession::new(quiz(3, 1), start).unwrap();
        answer(&mut session, 3);
        answer(&mut session, 1);
        answer(&mut session, 2);

        let submission = session
            .begin_submission(SubmitTrigger::Manual, start + Duration::from_secs(42))
            .unwrap();
        let order: Vec<_> = submission
            .answers
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        assert_eq!(order, ["q1", "q2", "q3"]);
        assert_eq!(submission.time_spent_seconds, 42);
        assert_eq!(session.phase(), Phase::Submitting);

        assert!(matches!(
            session.begin_submission(SubmitTrigger::Manual, Instant::now()),
            Err(SessionError::SubmissionInFlight)
        ));

        let summary = session.complete_submission(ok_result(), Utc::now()).unwrap();
        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.time_spent_seconds, 42);
        assert_eq!(session.phase(), Phase::Submitted);
        assert_eq!(session.tick(), Tick::Finished);
    }

    #[test]
    fn test_countdown_expires_once() {
        let mut session = AttemptSession::new(quiz(2, 1), Instant::now()).unwrap();
        for expected in (1..60).rev() {
            assert_eq!(session.tick(), Tick::Remaining(expected));
        }
        assert_eq!(session.tick(), Tick::Expired);
        assert!(session.has_expired());

        // A failed timeout submission leaves the session in progress at zero.
        session
            .begin_submission(SubmitTrigger::Timeout, Instant::now())
            .unwrap();
        let err = session
            .complete_submission(
                Err(ServiceError::Status {
                    status: 502,
                    message: String::new(),
                }),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(session.notice(), Some(&Notice::Retry));
        assert_eq!(session.tick(), Tick::Remaining(0));

        // The retry keeps the partial-answers allowance.
        let submission = session
            .begin_submission(SubmitTrigger::Manual, Instant::now())
            .unwrap();
        assert!(submission.answers.is_empty());
    }

    #[test]
    fn test_countdown_paused_outside_progress() {
        let mut session = session(1);
        session.apply_cooldown(CooldownStatus::blocked_until(None), Utc::now());
        assert_eq!(session.tick(), Tick::Paused);
        assert_eq!(session.remaining_seconds(), 60);
    }

    #[test]
    fn test_timeout_submits_partial_answers() {
        let mut session = session(5);
        answer(&mut session, 2);
        answer(&mut session, 4);

        let submission = session
            .begin_submission(SubmitTrigger::Timeout, Instant::now())
            .unwrap();
        let ids: Vec<_> = submission
            .answers
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        assert_eq!(ids, ["q2", "q4"]);
    }

    #[test]
    fn test_cooldown_blocks_submission() {
        let now = Utc::now();
        let next = now + TimeDelta::minutes(5);
        let mut session = session(1);
        answer(&mut session, 1);

        session.apply_cooldown(CooldownStatus::blocked_until(Some(next)), now);
        assert_eq!(session.phase(), Phase::CoolingDown);
        assert_eq!(session.pending_wakeup(now), Some(Duration::from_secs(300)));

        let err = session
            .begin_submission(SubmitTrigger::Manual, Instant::now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Cooldown { next_attempt_at: Some(at) } if at == next));

        // Selections stay possible while cooling down.
        session
            .select_option(QuestionId::new("q1"), OptionId::new("q1-o2"))
            .unwrap();

        session.lift_cooldown();
        assert_eq!(session.phase(), Phase::InProgress);
        assert!(session.cooldown().is_none());
        assert!(session.pending_wakeup(now).is_none());
    }

    #[test]
    fn test_cooldown_in_the_past_is_ignored() {
        let now = Utc::now();
        let mut session = session(1);
        session.apply_cooldown(
            CooldownStatus::blocked_until(Some(now - TimeDelta::seconds(1))),
            now,
        );
        assert_eq!(session.phase(), Phase::InProgress);

        session.apply_cooldown(CooldownStatus::open(), now);
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn test_cooldown_rejection_keeps_answers() {
        let now = Utc::now();
        let next = now + TimeDelta::minutes(5);
        let mut session = session(2);
        answer(&mut session, 1);
        answer(&mut session, 2);

        session
            .begin_submission(SubmitTrigger::Manual, Instant::now())
            .unwrap();
        let err = session
            .complete_submission(
                Err(ServiceError::Cooldown {
                    next_attempt_at: Some(next),
                }),
                now,
            )
            .unwrap_err();

        assert!(matches!(err, SessionError::Cooldown { .. }));
        assert_eq!(session.phase(), Phase::CoolingDown);
        assert_eq!(session.answered_count(), 2);
        assert_eq!(
            session.cooldown(),
            Some(&CooldownStatus::blocked_until(Some(next)))
        );
        assert_eq!(
            session.notice(),
            Some(&Notice::Cooldown {
                next_attempt_at: Some(next)
            })
        );
    }

    #[test]
    fn test_result_discarded_after_teardown() {
        let mut session = session(1);
        answer(&mut session, 1);
        session
            .begin_submission(SubmitTrigger::Manual, Instant::now())
            .unwrap();
        session.teardown();

        assert!(matches!(
            session.complete_submission(ok_result(), Utc::now()),
            Err(SessionError::Closed)
        ));
        assert!(session.summary().is_none());
        assert!(matches!(
            session.select_option(QuestionId::new("q1"), OptionId::new("q1-o1")),
            Err(SessionError::Closed)
        ));
    }

    #[test]
    fn test_snapshot() {
        let mut session = session(4);
        answer(&mut session, 1);
        session.go_next().unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.total_questions, 4);
        assert_eq!(snapshot.question.text, "Question 2");
        assert_eq!(snapshot.selected_option, None);
        assert_eq!(snapshot.answered, 1);
        assert_eq!(snapshot.clock, "1:00");
        assert_eq!(snapshot.band, TimerBand::Normal);
        assert_eq!(snapshot.progress_percent, 50.0);
    }
}
