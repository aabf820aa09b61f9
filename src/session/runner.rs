//! Tokio driver for an [`AttemptSession`].

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{OptionId, QuestionId, Quiz, QuizId};
use crate::protocol::{AttemptSubmission, AttemptSummary};
use crate::services::{CooldownService, SubmissionService};

use super::state::{AttemptSession, Phase, SessionSnapshot, SubmitTrigger, Tick};
use super::SessionError;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background tasks owned by a runner.
#[derive(Default)]
struct Tasks {
    countdown: Option<JoinHandle<()>>,
    wakeup: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        for handle in [self.countdown.take(), self.wakeup.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

struct Inner {
    id: Uuid,
    quiz_id: QuizId,
    session: Mutex<AttemptSession>,
    submissions: Arc<dyn SubmissionService>,
    tasks: StdMutex<Tasks>,
}

/// Drives one attempt session.
///
/// Every operation goes through the same lock, so the countdown, the
/// cooldown wake-up and user actions never interleave. Cloning yields
/// another handle to the same session.
#[derive(Clone)]
pub struct AttemptRunner {
    inner: Arc<Inner>,
}

impl AttemptRunner {
    /// Begin an attempt on a persisted quiz.
    ///
    /// Looks up the cooldown status first; when the lookup fails the
    /// attempt starts anyway.
    pub async fn start(
        quiz: Quiz,
        cooldowns: &dyn CooldownService,
        submissions: Arc<dyn SubmissionService>,
    ) -> Result<Self, SessionError> {
        let mut session = AttemptSession::new(quiz, Instant::now())?;
        let id = Uuid::new_v4();
        let quiz_id = session.quiz_id().clone();

        match cooldowns.get_cooldown_status(&quiz_id).await {
            Ok(status) => session.apply_cooldown(status, Utc::now()),
            Err(err) => {
                warn!(session = %id, quiz_id = %quiz_id, error = %err, "cooldown check failed")
            }
        }
        let wakeup = session.pending_wakeup(Utc::now());

        info!(
            session = %id,
            quiz_id = %quiz_id,
            questions = session.quiz().questions.len(),
            remaining = session.remaining_seconds(),
            cooling_down = (session.phase() == Phase::CoolingDown),
            "attempt started"
        );

        let inner = Arc::new(Inner {
            id,
            quiz_id,
            session: Mutex::new(session),
            submissions,
            tasks: StdMutex::new(Tasks::default()),
        });
        inner.spawn_countdown();
        if let Some(delay) = wakeup {
            inner.schedule_wakeup(delay);
        }

        Ok(Self { inner })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn quiz_id(&self) -> &QuizId {
        &self.inner.quiz_id
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().await.snapshot()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.session.lock().await.phase()
    }

    pub async fn select_option(
        &self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<(), SessionError> {
        self.inner
            .session
            .lock()
            .await
            .select_option(question, option)
    }

    pub async fn go_next(&self) -> Result<usize, SessionError> {
        self.inner.session.lock().await.go_next()
    }

    pub async fn go_previous(&self) -> usize {
        self.inner.session.lock().await.go_previous()
    }

    /// Submit the attempt on the user's request.
    ///
    /// Local validation failures never reach the network.
    pub async fn submit(&self) -> Result<AttemptSummary, SessionError> {
        let submission = self
            .inner
            .session
            .lock()
            .await
            .begin_submission(SubmitTrigger::Manual, Instant::now())?;
        self.inner.deliver(submission).await
    }

    /// Stop the countdown and any pending wake-up and end the session.
    ///
    /// A submission already in flight finishes, but its result is dropped.
    pub async fn teardown(&self) {
        // Held while aborting so no delivery can schedule a wake-up in between.
        let mut session = self.inner.session.lock().await;
        session.teardown();
        self.inner.tasks().abort_all();
        debug!(session = %self.inner.id, "attempt torn down");
    }
}

impl Inner {
    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_countdown(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                if !inner.on_tick().await {
                    break;
                }
            }
        });
        self.tasks().countdown = Some(handle);
    }

    /// Returns false once the countdown should stop.
    async fn on_tick(self: &Arc<Self>) -> bool {
        let mut session = self.session.lock().await;
        let tick = session.tick();
        match tick {
            Tick::Finished => false,
            Tick::Paused | Tick::Remaining(_) => true,
            Tick::Expired => {
                info!(
                    session = %self.id,
                    answered = session.answered_count(),
                    "time is up, submitting"
                );
                let started = session.begin_submission(SubmitTrigger::Timeout, Instant::now());
                match started {
                    Ok(submission) => {
                        drop(session);
                        // Detached so that a teardown cannot cancel the call midway.
                        let inner = Arc::clone(self);
                        tokio::spawn(async move {
                            let _ = inner.deliver(submission).await;
                        });
                    }
                    Err(err) => {
                        warn!(session = %self.id, error = %err, "timeout submission not sent")
                    }
                }
                true
            }
        }
    }

    async fn deliver(
        self: &Arc<Self>,
        submission: AttemptSubmission,
    ) -> Result<AttemptSummary, SessionError> {
        let outcome = self
            .submissions
            .submit_attempt(&self.quiz_id, &submission)
            .await;

        let mut session = self.session.lock().await;
        let result = session.complete_submission(outcome, Utc::now());
        match &result {
            Ok(summary) => {
                info!(
                    session = %self.id,
                    score = summary.score,
                    correct = summary.correct_answers,
                    time_spent = summary.time_spent_seconds,
                    "attempt submitted"
                );
                self.tasks().abort_all();
            }
            Err(SessionError::Cooldown { next_attempt_at }) => {
                info!(session = %self.id, ?next_attempt_at, "attempt refused for cooldown");
                if let Some(delay) = session.pending_wakeup(Utc::now()) {
                    self.schedule_wakeup(delay);
                }
            }
            Err(SessionError::Closed) => {
                debug!(session = %self.id, "discarding submission result for closed session");
            }
            Err(err) => {
                warn!(
                    session = %self.id,
                    error = %err,
                    source = ?std::error::Error::source(err),
                    "submission failed"
                );
            }
        }
        result
    }

    /// Replace any pending wake-up with one firing after `delay`.
    fn schedule_wakeup(self: &Arc<Self>, delay: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.session.lock().await.lift_cooldown();
                info!(session = %inner.id, "cooldown over");
            }
        });
        debug!(session = %self.id, delay_secs = delay.as_secs(), "cooldown wake-up scheduled");

        if let Some(previous) = self.tasks().wakeup.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}
