//! Fixed-delay retry and interruptible back-off.
//!
//! # Design
//! - Budgets come from configuration; this module only counts attempts and waits.
//! - A wait happens between two failed attempts, never after the last one.
//! - Waiting goes through [`Sleeper`] so tests can observe delays and shutdown
//!   can cut a wait short.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use dropvault_config::RetryBudget;
use thiserror::Error;

/// A back-off wait ended because shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait interrupted by shutdown")]
pub struct Interrupted;

/// Blocking wait used between retry attempts.
pub trait Sleeper: Send + Sync {
    /// Block the calling thread for `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] when the wait is cut short.
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted>;
}

/// Plain `thread::sleep`; never interrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        thread::sleep(delay);
        Ok(())
    }
}

/// Process-wide shutdown flag that doubles as an interruptible sleeper.
///
/// Once triggered, every pending and future [`Sleeper::sleep`] returns
/// [`Interrupted`] immediately.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    /// Create an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake every waiter and make later waits fail fast.
    pub fn trigger(&self) {
        let (flag, wakeup) = &*self.state;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wakeup.notify_all();
    }

    /// Whether [`ShutdownSignal::trigger`] has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        let (flag, _) = &*self.state;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sleeper for ShutdownSignal {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        let (flag, wakeup) = &*self.state;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = wakeup
            .wait_timeout_while(guard, delay, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        if *guard { Err(Interrupted) } else { Ok(()) }
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt of the budget failed.
    #[error("retry budget exhausted")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        last: E,
    },
    /// The wait after a failed attempt was interrupted.
    #[error("retry interrupted")]
    Interrupted {
        /// Attempt that failed just before the interrupted wait.
        attempt: u32,
    },
}

/// Run `op` until it succeeds or the budget is spent.
///
/// `op` receives the 1-based attempt number. `on_failure` sees every failed
/// attempt, including the last. On success the value is returned with the
/// number of attempts it took.
///
/// # Errors
///
/// [`RetryError::Exhausted`] after `budget.attempts` failures, or
/// [`RetryError::Interrupted`] when a back-off wait is cut short.
pub fn retry_with_budget<T, E, S, F, H>(
    budget: RetryBudget,
    sleeper: &S,
    mut op: F,
    mut on_failure: H,
) -> Result<(T, u32), RetryError<E>>
where
    S: Sleeper + ?Sized,
    F: FnMut(u32) -> Result<T, E>,
    H: FnMut(u32, &E),
{
    let attempts = budget.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok((value, attempt)),
            Err(err) => {
                on_failure(attempt, &err);
                if attempt >= attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
            }
        }
        if sleeper.sleep(budget.delay).is_err() {
            return Err(RetryError::Interrupted { attempt });
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingSleeper;
    use std::num::NonZeroU32;
    use std::time::Instant;

    fn budget(attempts: u32, delay_ms: u64) -> RetryBudget {
        RetryBudget::new(
            NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN),
            Duration::from_millis(delay_ms),
        )
    }

    #[test]
    fn success_after_k_failures_sleeps_k_times() {
        for failures in 0..4_u32 {
            let sleeper = RecordingSleeper::new();
            let mut seen = Vec::new();
            let result = retry_with_budget(
                budget(5, 250),
                &sleeper,
                |attempt| if attempt <= failures { Err(attempt) } else { Ok("done") },
                |attempt, _| seen.push(attempt),
            );
            assert!(matches!(result, Ok(("done", used)) if used == failures + 1));
            assert_eq!(sleeper.delays(), vec![Duration::from_millis(250); failures as usize]);
            assert_eq!(seen, (1..=failures).collect::<Vec<_>>());
        }
    }

    #[test]
    fn exhaustion_makes_exactly_budget_attempts() {
        let sleeper = RecordingSleeper::new();
        let mut calls = 0;
        let result: Result<((), u32), _> = retry_with_budget(
            budget(3, 1_000),
            &sleeper,
            |attempt| {
                calls += 1;
                Err(format!("attempt {attempt}"))
            },
            |_, _| {},
        );
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "attempt 3");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls, 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[test]
    fn single_attempt_budget_never_sleeps() {
        let sleeper = RecordingSleeper::new();
        let result: Result<((), u32), RetryError<()>> =
            retry_with_budget(RetryBudget::single_attempt(), &sleeper, |_| Err(()), |_, _| {});
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn triggered_signal_interrupts_back_off() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.is_triggered());

        let mut calls = 0;
        let result: Result<((), u32), RetryError<()>> = retry_with_budget(
            budget(3, 60_000),
            &signal,
            |_| {
                calls += 1;
                Err(())
            },
            |_, _| {},
        );
        assert!(matches!(result, Err(RetryError::Interrupted { attempt: 1 })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn trigger_wakes_a_pending_sleep() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || {
                let started = Instant::now();
                let outcome = signal.sleep(Duration::from_secs(30));
                (outcome, started.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(50));
        signal.trigger();

        let (outcome, elapsed) = waiter.join().unwrap_or((Ok(()), Duration::MAX));
        assert_eq!(outcome, Err(Interrupted));
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn untriggered_signal_sleeps_for_the_delay() {
        let signal = ShutdownSignal::new();
        let started = Instant::now();
        assert_eq!(signal.sleep(Duration::from_millis(20)), Ok(()));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(ThreadSleeper.sleep(Duration::ZERO), Ok(()));
    }
}
