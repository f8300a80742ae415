//! Fuzz target for the session coordinator.
//!
//! Arbitrary operation sequences from every collaborator at once: peers,
//! captures, chat transport, the local user and the clock.
//!
//! # Invariants
//!
//! - Real session observable state matches the reference model
//! - Standard invariants hold after every operation
//! - No media handle is released twice
//! - Leaving releases every stream and connection, including captures that
//!   complete afterwards

#![no_main]

use arbitrary::Arbitrary;
use huddle_harness::{InvariantRegistry, ModelSession, Operation, SimWorld};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct SessionScenario {
    ops: Vec<Operation>,
    /// Leave at the end so release can be checked.
    leave: bool,
}

fuzz_target!(|scenario: SessionScenario| {
    let invariants = InvariantRegistry::standard();
    let mut model = ModelSession::new();
    let mut world = SimWorld::new();

    for op in scenario.ops.iter().take(256) {
        model.apply(op);
        world.apply(op);

        invariants.assert_all(&world.snapshot(), &format!("after {op:?}"));
        assert_eq!(model.observable_state(), world.observable_state(), "diverged after {op:?}");
    }

    if scenario.leave {
        world.apply(&Operation::Leave);
        for _ in 0..=scenario.ops.len().min(256) {
            world.apply(&Operation::ResolveDesktop { granted: true });
            world.apply(&Operation::ResolveLocalMedia { granted: true });
        }
        assert!(world.ledger().live_streams().is_empty());
        assert!(world.ledger().live_connections().is_empty());
    }

    assert_eq!(world.ledger().double_releases(), 0);
});
