//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from the system clock. Production uses
//! [`SystemEnv`]; simulation supplies a virtual clock so notification expiry
//! and message timestamps are reproducible.

use std::{
    fmt,
    ops::Sub,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Abstract environment providing time.
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + 'static {
    /// The instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; simulation uses a virtual
    /// instant.
    type Instant: Copy + Ord + fmt::Debug + Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Used to timestamp chat messages. May go backwards with the system
    /// clock; never used for ordering.
    fn unix_millis(&self) -> u64;
}

/// Environment backed by the system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let env = SystemEnv::new();
        let first = env.now();
        let second = env.now();
        assert!(second >= first);
    }

    #[test]
    fn unix_millis_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemEnv::new().unix_millis() > 1_577_836_800_000);
    }
}
