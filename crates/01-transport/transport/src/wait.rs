//! Open-retry loop and the knobs that shape how it waits.
//!
//! Acquiring a record never gives up on its own: a participant keeps trying
//! until the counterpart produces or consumes the payload. The wait strategy
//! only decides how politely the loop burns time between attempts, and the
//! cancellation token is the single way to leave the loop without success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Deserializer};

use crate::error::{RecordError, RecordResult, Unavailable};
use crate::record::RecordId;

/// How the retry loop pauses between two acquisition attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Busy-spin with a CPU relax hint.
    Spin,
    /// Hand the core back to the scheduler.
    Yield,
    /// Sleep (or block on the store's wakeup signal) for at most the given
    /// duration. Configured in microseconds.
    Park(#[serde(deserialize_with = "micros")] Duration),
}

impl Default for WaitStrategy {
    fn default() -> Self {
        WaitStrategy::Park(Duration::from_millis(1))
    }
}

fn micros<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
    u64::deserialize(de).map(Duration::from_micros)
}

/// Shared flag that aborts every open-retry loop observing it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Wait strategy plus the cancellation token it honours.
#[derive(Clone, Debug, Default)]
pub struct Waiter {
    pub strategy: WaitStrategy,
    pub cancel: CancelToken,
}

impl Waiter {
    pub fn new(strategy: WaitStrategy, cancel: CancelToken) -> Self {
        Self { strategy, cancel }
    }

    /// Pauses once according to the strategy. `park` receives the timeout
    /// for [`WaitStrategy::Park`] and is not called for the other strategies.
    pub fn pause(&self, park: impl FnOnce(Duration)) {
        match self.strategy {
            WaitStrategy::Spin => std::hint::spin_loop(),
            WaitStrategy::Yield => std::thread::yield_now(),
            WaitStrategy::Park(timeout) => park(timeout),
        }
    }
}

/// Repeats `attempt` until it succeeds, pausing through `park` between
/// failures. Returns the acquired value and the number of attempts made.
///
/// There is no timeout and no cap. The only other exit is cancellation,
/// checked before every attempt.
pub fn retry_open<T>(
    waiter: &Waiter,
    id: RecordId,
    mut attempt: impl FnMut() -> Result<T, Unavailable>,
    mut park: impl FnMut(Duration),
) -> RecordResult<(T, u64)> {
    let mut attempts = 0u64;
    loop {
        if waiter.cancel.is_cancelled() {
            return Err(RecordError::Cancelled { id });
        }
        attempts += 1;
        match attempt() {
            Ok(value) => return Ok((value, attempts)),
            Err(Unavailable::Io(err)) => {
                debug!("open {id}: attempt {attempts} failed: {err}");
            }
            Err(Unavailable::Absent | Unavailable::Busy) => {}
        }
        waiter.pause(&mut park);
    }
}
