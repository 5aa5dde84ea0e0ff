//! Circuit breaking for adapters that call external systems
//!
//! ```text
//! Closed --failure_threshold consecutive failures--> Open
//! Open   --reset_timeout elapsed, next call--------> HalfOpen (one trial call)
//! HalfOpen --trial fails---------------------------> Open
//! HalfOpen --success_threshold trial successes-----> Closed
//! ```
//!
//! While half-open only one trial call is let through at a time; other
//! callers are refused until it reports back.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::ports::CircuitBreakerConfig;

/// Observable state of a breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum Inner {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32, trial_in_flight: bool },
}

/// Consecutive-failure circuit breaker
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::Closed { failures: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.config.reset_timeout_secs)
    }

    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Returns true if a call would be refused right now
    ///
    /// Does not claim the half-open trial slot.
    pub fn is_open(&self) -> bool {
        match *self.lock() {
            Inner::Closed { .. } => false,
            Inner::Open { since } => since.elapsed() < self.reset_timeout(),
            Inner::HalfOpen { trial_in_flight, .. } => trial_in_flight,
        }
    }

    /// Asks to make one call
    ///
    /// Every `true` must be followed by `record_success` or `record_failure`.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.lock();
        match *inner {
            Inner::Closed { .. } => true,
            Inner::Open { since } if since.elapsed() >= self.reset_timeout() => {
                *inner = Inner::HalfOpen {
                    successes: 0,
                    trial_in_flight: true,
                };
                true
            }
            Inner::Open { .. } => false,
            Inner::HalfOpen {
                successes,
                trial_in_flight: false,
            } => {
                *inner = Inner::HalfOpen {
                    successes,
                    trial_in_flight: true,
                };
                true
            }
            Inner::HalfOpen { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match *inner {
            Inner::Closed { .. } => *inner = Inner::Closed { failures: 0 },
            Inner::HalfOpen { successes, .. } => {
                let successes = successes + 1;
                *inner = if successes >= self.config.success_threshold {
                    Inner::Closed { failures: 0 }
                } else {
                    Inner::HalfOpen {
                        successes,
                        trial_in_flight: false,
                    }
                };
            }
            Inner::Open { .. } => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match *inner {
            Inner::Closed { failures } => {
                let failures = failures + 1;
                *inner = if failures >= self.config.failure_threshold {
                    Inner::Open { since: Instant::now() }
                } else {
                    Inner::Closed { failures }
                };
            }
            Inner::HalfOpen { .. } => *inner = Inner::Open { since: Instant::now() },
            Inner::Open { .. } => {}
        }
    }
}
