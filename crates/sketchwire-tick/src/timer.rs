//! One-shot phase timer and the epoch counter that guards it.

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// A generation counter.
///
/// The room bumps its epoch on every phase change. Anything scheduled
/// under an older epoch (a timer payload, a word fetch) is stale once the
/// epoch moves and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
    /// The first epoch.
    pub const ZERO: Self = Self(0);

    /// Advances to the next generation and returns it.
    pub fn bump(&mut self) -> Self {
        self.0 = self.0.wrapping_add(1);
        *self
    }

    /// Returns `true` if `other` was issued under this generation.
    pub fn is_current(self, other: Self) -> bool {
        self == other
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

/// Single-slot one-shot timer carrying a payload.
///
/// At most one deadline is pending. [`arm`](Self::arm) replaces any
/// previous one, [`disarm`](Self::disarm) cancels it.
#[derive(Debug)]
pub struct PhaseTimer<T> {
    slot: Option<(Instant, T)>,
}

impl<T> Default for PhaseTimer<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> PhaseTimer<T> {
    /// Creates an unarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to fire after `delay`, replacing any pending one.
    pub fn arm(&mut self, delay: Duration, payload: T) {
        trace!(delay_ms = delay.as_millis() as u64, "phase timer armed");
        self.slot = Some((Instant::now() + delay, payload));
    }

    /// Cancels the pending deadline, returning its payload if there was one.
    pub fn disarm(&mut self) -> Option<T> {
        self.slot.take().map(|(_, payload)| payload)
    }

    /// Waits for the pending deadline and yields its payload.
    ///
    /// Pends forever while unarmed. Cancel-safe: the payload is only taken
    /// once the deadline has passed.
    pub async fn expired(&mut self) -> T {
        let deadline = match &self.slot {
            Some((deadline, _)) => *deadline,
            None => std::future::pending().await,
        };
        time::sleep_until(deadline).await;
        match self.slot.take() {
            Some((_, payload)) => payload,
            None => std::future::pending().await,
        }
    }
}
