//! Timing primitives for Sketchwire rooms.
//!
//! - [`TickScheduler`]: a pausable fixed-period clock. Rooms run it at
//!   1 Hz during a turn to count down the round timer, and keep it paused
//!   otherwise.
//! - [`PhaseTimer`]: a single-slot one-shot timer for delayed phase
//!   transitions (start delay, round-end pause, restart). Arming replaces
//!   whatever was pending.
//! - [`Epoch`]: a generation counter used to reject stale timer and
//!   background-task results after the room has moved on.
//!
//! # Integration
//!
//! All three sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         info = clock.wait_for_tick() => { /* 1 + info.ticks_skipped seconds elapsed */ }
//!         pending = timer.expired() => { /* delayed transition */ }
//!     }
//! }
//! ```
//!
//! Both `wait_for_tick` and `expired` pend forever while there is nothing
//! to do, so `select!` simply keeps servicing the other branches.

mod timer;

pub use timer::{Epoch, PhaseTimer};

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Must be non-zero.
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

impl TickConfig {
    /// Shortest accepted period.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Create a config for a specific period.
    pub fn with_period(period: Duration) -> Self {
        Self { period }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_secs_f64() * 1000.0,
                "tick period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Whole periods that elapsed unobserved before this tick (0 in normal
    /// operation). A consumer counting time should add `1 + ticks_skipped`.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Pausable fixed-period clock.
///
/// Created paused. [`resume`](Self::resume) arms the first tick one period
/// from now; [`pause`](Self::pause) stops it. One per room actor.
///
/// A late wake-up never fires a burst of catch-up ticks: the missed
/// periods are reported in [`TickInfo::ticks_skipped`] and the next tick is
/// scheduled a full period after the late one.
pub struct TickScheduler {
    config: TickConfig,
    next_tick: Option<Instant>,
    paused: bool,
}

impl TickScheduler {
    /// Create a new, paused scheduler.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            period_ms = config.period.as_secs_f64() * 1000.0,
            "tick scheduler created"
        );
        Self {
            config,
            next_tick: None,
            paused: true,
        }
    }

    /// Wait until the next tick is due.
    ///
    /// While paused this future pends forever. It is cancel-safe: dropping
    /// it before it resolves leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = match self.next_tick {
            Some(next) if !self.paused => next,
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let period = self.config.period;
        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
        if ticks_skipped > 0 {
            warn!(
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }

        self.next_tick = Some(now + period);
        trace!(ticks_skipped, "tick fired");

        TickInfo { ticks_skipped }
    }

    /// Stop ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.next_tick = None;
            debug!("tick scheduler paused");
        }
    }

    /// Start ticking; the next tick fires one full period from now.
    ///
    /// Idempotent while running: an already-running clock keeps its
    /// current deadline.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = Some(Instant::now() + self.config.period);
            debug!("tick scheduler resumed");
        }
    }

    /// Pause and immediately resume, so the next tick is a full period away.
    pub fn restart(&mut self) {
        self.pause();
        self.resume();
    }
}
