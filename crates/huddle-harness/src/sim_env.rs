//! Virtual clock environment.
//!
//! Time only moves when a test calls [`SimEnv::advance`]. Clones share the
//! clock, so a test keeps one handle while the session owns another.

use std::{
    ops::Sub,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use huddle_core::Environment;

/// Wall-clock time at simulation start (2023-11-14T22:13:20Z).
pub const SIM_EPOCH_MILLIS: u64 = 1_700_000_000_000;

/// Instant on the virtual clock, in milliseconds since simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(u64);

impl SimInstant {
    /// Instant `millis` after simulation start.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since simulation start.
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

/// Simulation environment with a shared virtual clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    millis: Arc<AtomicU64>,
}

impl SimEnv {
    /// Create an environment at simulation start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Time since simulation start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.millis.load(Ordering::SeqCst))
    }

    fn unix_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS + self.millis.load(Ordering::SeqCst)
    }
}
