//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! session behaves identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!     ModelSession     SimWorld        Compare
//!     (reference)   (real session)   + invariants
//! ```

use huddle_harness::{
    InvariantRegistry, MAX_PEERS, ModelSession, Operation, SimWorld, TileTarget,
};
use proptest::prelude::*;

fn tile_target_strategy() -> impl Strategy<Value = TileTarget> {
    prop_oneof![
        1 => Just(TileTarget::LocalCamera),
        1 => Just(TileTarget::LocalDesktop),
        3 => (0..MAX_PEERS + 1).prop_map(TileTarget::Peer),
    ]
}

/// Strategy for generating operations.
///
/// Peer slots range one past [`MAX_PEERS`] so wrapped identifiers show up.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    let peer = 0..MAX_PEERS + 1;

    prop_oneof![
        // Weight towards peers coming and going
        4 => peer.clone().prop_map(|peer| Operation::PeerJoin { peer }),
        2 => peer.clone().prop_map(|peer| Operation::PeerConnect { peer }),
        2 => peer.clone().prop_map(|peer| Operation::PeerClose { peer }),
        1 => peer.clone().prop_map(|peer| Operation::PeerError { peer }),
        3 => peer.clone().prop_map(|peer| Operation::RemoteStreamAttach { peer }),
        1 => peer.clone().prop_map(|peer| Operation::RemoteStreamDetach { peer }),
        2 => peer.prop_map(|peer| Operation::ReceiveMessage { peer }),
        2 => any::<bool>().prop_map(|fail| Operation::SendMessage { fail }),
        2 => Just(Operation::ToggleChat),
        2 => tile_target_strategy().prop_map(|target| Operation::SetActive { target }),
        2 => Just(Operation::RequestDesktop),
        2 => any::<bool>().prop_map(|granted| Operation::ResolveDesktop { granted }),
        1 => any::<bool>().prop_map(|granted| Operation::ResolveLocalMedia { granted }),
        1 => Just(Operation::StopDesktop),
        1 => Just(Operation::HangUp),
        1 => Just(Operation::ToggleAudio),
        1 => Just(Operation::ToggleVideo),
        1 => any::<u8>().prop_map(|index| Operation::Dismiss { index }),
        1 => any::<u16>().prop_map(|millis| Operation::AdvanceTime { millis }),
        // Rare: everything after it is a no-op
        1 => Just(Operation::Leave),
    ]
}

proptest! {
    /// Observable state matches the model after every operation.
    #[test]
    fn prop_model_matches_real(ops in prop::collection::vec(operation_strategy(), 0..80)) {
        let mut model = ModelSession::new();
        let mut real = SimWorld::new();

        for (i, op) in ops.iter().enumerate() {
            model.apply(op);
            real.apply(op);

            prop_assert_eq!(
                model.observable_state(),
                real.observable_state(),
                "Divergence at operation {}: {:?}",
                i,
                op
            );
        }
    }

    /// Standard invariants, including the release ledger, hold after every
    /// operation.
    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(operation_strategy(), 0..80)) {
        let mut world = SimWorld::new();
        let invariants = InvariantRegistry::standard();

        for op in &ops {
            world.apply(op);

            let snapshot = world.snapshot();
            let result = invariants.check_all(&snapshot);
            prop_assert!(result.is_ok(), "Invariant violated after {:?}: {:?}", op, result);
        }

        prop_assert_eq!(world.ledger().double_releases(), 0);
    }

    /// Leaving releases every handle, whatever happened before.
    #[test]
    fn prop_leave_releases_all(ops in prop::collection::vec(operation_strategy(), 0..60)) {
        let mut world = SimWorld::new();
        for op in &ops {
            world.apply(op);
        }

        world.apply(&Operation::Leave);
        // Outstanding captures complete after leave and must be released
        for _ in 0..ops.len() + 1 {
            world.apply(&Operation::ResolveDesktop { granted: true });
            world.apply(&Operation::ResolveLocalMedia { granted: true });
        }

        prop_assert!(world.ledger().live_streams().is_empty());
        prop_assert!(world.ledger().live_connections().is_empty());
        prop_assert!(world.session().streams().is_empty());
        prop_assert!(world.session().roster().is_empty());
    }

    /// Chat sequence numbers count up from zero without gaps.
    #[test]
    fn prop_chat_sequences_dense(ops in prop::collection::vec(operation_strategy(), 0..80)) {
        let mut world = SimWorld::new();
        for op in &ops {
            world.apply(op);
        }

        let sequences: Vec<u64> =
            world.session().chat().messages().iter().map(|m| m.sequence).collect();
        let expected: Vec<u64> = (0..sequences.len() as u64).collect();
        prop_assert_eq!(sequences, expected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_and_real_agree_on_call_lifecycle() {
        let ops = [
            Operation::ResolveLocalMedia { granted: true },
            Operation::PeerJoin { peer: 1 },
            Operation::PeerJoin { peer: 2 },
            Operation::PeerConnect { peer: 1 },
            Operation::RemoteStreamAttach { peer: 1 },
            Operation::SetActive { target: TileTarget::Peer(1) },
            Operation::RequestDesktop,
            Operation::ResolveDesktop { granted: true },
            Operation::ReceiveMessage { peer: 2 },
            Operation::PeerClose { peer: 1 },
            Operation::HangUp,
            Operation::ToggleChat,
            Operation::Leave,
        ];

        let mut model = ModelSession::new();
        let mut real = SimWorld::new();
        for op in &ops {
            model.apply(op);
            real.apply(op);
            assert_eq!(model.observable_state(), real.observable_state(), "after {op:?}");
        }

        let state = real.observable_state();
        assert!(state.ended);
        assert_eq!(state.chat_len, 1);
        assert_eq!(state.unread, 0);
    }

    #[test]
    fn focus_follows_peer_lifecycle() {
        let mut model = ModelSession::new();
        let mut real = SimWorld::new();

        for op in [
            Operation::SetActive { target: TileTarget::Peer(3) },
            Operation::PeerJoin { peer: 3 },
            Operation::SetActive { target: TileTarget::Peer(3) },
            Operation::PeerClose { peer: 3 },
        ] {
            model.apply(&op);
            real.apply(&op);
        }

        assert_eq!(model.observable_state(), real.observable_state());
        assert_eq!(real.session().active_participant(), None);
    }
}
