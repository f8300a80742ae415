//! Fuzz target for configuration parsing.
//!
//! Configuration arrives as JSON from the embedding page. Any input must
//! either fail to parse or yield a config whose derived durations and
//! capacities are usable.

#![no_main]

use huddle_app::{Session, SessionConfig};
use huddle_harness::{SimConnection, SimEnv, SimStream};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<SessionConfig>(data) else {
        return;
    };

    assert!(!config.tick_interval().is_zero());
    assert!(config.channel_capacity() >= 1);

    let mut session: Session<SimEnv, SimStream, SimConnection> =
        Session::new(SimEnv::new(), config);
    session.initialize();
    let _ = session.tick();
    let _ = session.view();
});
