//! Interruptible pacing between remote calls

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Cooperative cancellation shared between the engine and a signal handler
///
/// Cancelling wakes any thread blocked in [`CancellationToken::sleep`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if let Ok(mut cancelled) = self.inner.cancelled.lock() {
            *cancelled = true;
        }
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.lock().map(|c| *c).unwrap_or(true)
    }

    /// Block for `duration` unless cancelled first
    ///
    /// Returns `true` if the full duration elapsed, `false` on cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let Ok(mut cancelled) = self.inner.cancelled.lock() else {
            return false;
        };

        loop {
            if *cancelled {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            match self.inner.wake.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => cancelled = guard,
                Err(_) => return false,
            }
        }
    }
}

/// Fixed delay between consecutive creation calls
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    token: CancellationToken,
}

impl Pacer {
    pub fn new(delay: Duration, token: CancellationToken) -> Self {
        Self { delay, token }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait out the delay; `false` means the run should stop
    pub fn pause(&self) -> bool {
        if self.delay.is_zero() {
            return !self.token.is_cancelled();
        }
        self.token.sleep(self.delay)
    }
}
