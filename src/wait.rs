//! Generic polling.
//!
//! [`wait_until`] calls a probe on a fixed interval until its value meets an
//! [`Expectation`] or the timeout passes. Probe errors are returned as-is;
//! callers that want to poll through transient failures map them into the
//! probe's value first.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::Result;

/// A condition on a probed value.
pub trait Expectation<T> {
    fn is_met(&self, value: &T) -> bool;
}

impl<T, F> Expectation<T> for F
where
    F: Fn(&T) -> bool,
{
    fn is_met(&self, value: &T) -> bool {
        self(value)
    }
}

/// The value equals the expected one.
#[derive(Debug, Clone)]
pub struct Equals<T>(pub T);

impl<T: PartialEq> Expectation<T> for Equals<T> {
    fn is_met(&self, value: &T) -> bool {
        *value == self.0
    }
}

/// The value differs from the given one.
#[derive(Debug, Clone)]
pub struct NotEquals<T>(pub T);

impl<T: PartialEq> Expectation<T> for NotEquals<T> {
    fn is_met(&self, value: &T) -> bool {
        *value != self.0
    }
}

/// A list holds at least this many items.
#[derive(Debug, Clone, Copy)]
pub struct AtLeast(pub usize);

impl<E> Expectation<Vec<E>> for AtLeast {
    fn is_met(&self, value: &Vec<E>) -> bool {
        value.len() >= self.0
    }
}

/// The probe produced something.
#[derive(Debug, Clone, Copy)]
pub struct IsSome;

impl<E> Expectation<Option<E>> for IsSome {
    fn is_met(&self, value: &Option<E>) -> bool {
        value.is_some()
    }
}

/// Outcome of [`wait_until`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult<T> {
    /// The value that met the expectation.
    Satisfied(T),
    /// The deadline passed first. `last` is the final probed value, if the
    /// probe ran at all.
    TimedOut { last: Option<T> },
}

impl<T> PollResult<T> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollResult::Satisfied(_))
    }

    /// The satisfying value, if any.
    pub fn satisfied(self) -> Option<T> {
        match self {
            PollResult::Satisfied(v) => Some(v),
            PollResult::TimedOut { .. } => None,
        }
    }

    /// The satisfying value, or the last probed value on timeout.
    pub fn into_last(self) -> Option<T> {
        match self {
            PollResult::Satisfied(v) => Some(v),
            PollResult::TimedOut { last } => last,
        }
    }
}

/// Poll `probe` every `interval` until its value meets `expectation`.
///
/// The deadline is fixed on entry and checked before every probe, so a zero
/// timeout never probes and the probe never starts after the deadline. The
/// sleep is a fixed `interval` regardless of how long the probe took.
pub async fn wait_until<T, P, Fut, X>(
    mut probe: P,
    expectation: X,
    timeout: Duration,
    interval: Duration,
) -> Result<PollResult<T>>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    X: Expectation<T>,
{
    let deadline = Instant::now() + timeout;
    let mut last = None;
    let mut attempts = 0u32;

    while Instant::now() < deadline {
        attempts += 1;
        trace!(attempts, "probe");
        let value = probe().await?;
        if expectation.is_met(&value) {
            trace!(attempts, "wait_until satisfied");
            return Ok(PollResult::Satisfied(value));
        }
        last = Some(value);
        sleep(interval).await;
    }

    debug!(attempts, ?timeout, "wait_until timed out");
    Ok(PollResult::TimedOut { last })
}
