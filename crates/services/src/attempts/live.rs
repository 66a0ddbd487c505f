use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use exam_core::model::{QuestionId, Selection};
use exam_core::{Attempt, AttemptResult, Clock, SubmitReason, TickOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::error::AttemptServiceError;

/// Receiving end for finished attempts, manual or timed out.
pub type AttemptResults = mpsc::UnboundedReceiver<AttemptResult>;

/// An attempt with a running countdown.
///
/// Owns the timer task: it is armed on start and restart, and torn down on
/// submit, abandon, and drop. Must be created inside a tokio runtime.
pub struct LiveAttempt {
    state: Arc<Mutex<Attempt>>,
    clock: Clock,
    tick_period: Duration,
    results: mpsc::UnboundedSender<AttemptResult>,
    timer: Option<JoinHandle<()>>,
}

enum Step {
    Continue,
    Stop,
    Finished(AttemptResult),
}

fn tick_once(state: &Mutex<Attempt>, clock: Clock) -> Step {
    let Ok(mut attempt) = state.lock() else {
        log::error!("attempt state poisoned, stopping timer");
        return Step::Stop;
    };
    match attempt.tick() {
        TickOutcome::Running(_) => Step::Continue,
        // A zero-length attempt starts expired and never sees the edge.
        TickOutcome::Idle if !attempt.is_active() || !attempt.clock().is_expired() => Step::Stop,
        TickOutcome::Idle | TickOutcome::Expired => {
            match attempt.submit(clock.now(), SubmitReason::TimeExpired) {
                Ok(result) => Step::Finished(result),
                Err(err) => {
                    log::warn!("auto-submit skipped: {err}");
                    Step::Stop
                }
            }
        }
    }
}

impl LiveAttempt {
    /// Start the countdown for `attempt`.
    #[must_use]
    pub fn start(attempt: Attempt, clock: Clock, tick_period: Duration) -> (Self, AttemptResults) {
        let (results, rx) = mpsc::unbounded_channel();
        let mut live = Self {
            state: Arc::new(Mutex::new(attempt)),
            clock,
            tick_period,
            results,
            timer: None,
        };
        live.arm_timer();
        (live, rx)
    }

    fn arm_timer(&mut self) {
        self.stop_timer();
        let state = Arc::clone(&self.state);
        let results = self.results.clone();
        let clock = self.clock;
        let period = self.tick_period;

        self.timer = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                match tick_once(&state, clock) {
                    Step::Continue => {}
                    Step::Stop => break,
                    Step::Finished(result) => {
                        if results.send(result).is_err() {
                            log::warn!("results consumer dropped before time expired");
                        }
                        break;
                    }
                }
            }
        }));
    }

    fn stop_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Attempt>, AttemptServiceError> {
        self.state
            .lock()
            .map_err(|_| AttemptServiceError::StatePoisoned)
    }

    /// Read the attempt without changing it.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::StatePoisoned` if a holder panicked.
    pub fn with_attempt<R>(&self, f: impl FnOnce(&Attempt) -> R) -> Result<R, AttemptServiceError> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// # Errors
    ///
    /// Returns `AttemptServiceError::StatePoisoned` if a holder panicked.
    pub fn select_answer(
        &self,
        item_id: QuestionId,
        selection: Selection,
    ) -> Result<(), AttemptServiceError> {
        self.lock()?.select_answer(item_id, selection);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AttemptServiceError::StatePoisoned` if a holder panicked.
    pub fn toggle_mark(&self, index: usize) -> Result<(), AttemptServiceError> {
        self.lock()?.toggle_mark(index);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AttemptServiceError::StatePoisoned` if a holder panicked.
    pub fn navigate(&self, target: isize) -> Result<(), AttemptServiceError> {
        self.lock()?.navigate(target);
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the countdown and submit. The result also goes to the results channel.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Attempt` if the attempt already ended
    /// (for instance the timer submitted it first).
    pub fn submit(&mut self) -> Result<AttemptResult, AttemptServiceError> {
        self.stop_timer();
        let result = self.lock()?.submit(self.clock.now(), SubmitReason::Manual)?;
        if self.results.send(result.clone()).is_err() {
            log::debug!("no results consumer for attempt {}", result.attempt_id);
        }
        Ok(result)
    }

    /// Stop the countdown and discard the attempt's answers.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::StatePoisoned` if a holder panicked.
    pub fn abandon(&mut self) -> Result<(), AttemptServiceError> {
        self.stop_timer();
        self.lock()?.abandon();
        Ok(())
    }

    /// Start over with a full clock and re-arm the countdown.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::StatePoisoned` if a holder panicked.
    pub fn restart(&mut self) -> Result<(), AttemptServiceError> {
        self.stop_timer();
        self.lock()?.restart(self.clock.now());
        self.arm_timer();
        Ok(())
    }
}

impl Drop for LiveAttempt {
    fn drop(&mut self) {
        self.stop_timer();
    }
}
