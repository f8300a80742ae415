//! Property-based tests for the Session state machine.
//!
//! Tests verify that invariants hold under arbitrary event sequences.

use huddle_app::{Intent, Session, SessionAction, SessionConfig, SessionEvent};
use huddle_core::ParticipantId;
use huddle_harness::{
    InvariantRegistry, MediaLedger, SessionSnapshot, SimConnection, SimEnv, SimStream,
};
use proptest::prelude::*;

type TestSession = Session<SimEnv, SimStream, SimConnection>;

/// Roster events over a handful of peers.
#[derive(Debug, Clone)]
enum RosterOp {
    Join(u8),
    Connect(u8),
    Close(u8),
    Focus(u8),
}

fn roster_op_strategy() -> impl Strategy<Value = RosterOp> {
    prop_oneof![
        3 => (0u8..5).prop_map(RosterOp::Join),
        2 => (0u8..5).prop_map(RosterOp::Connect),
        2 => (0u8..5).prop_map(RosterOp::Close),
        2 => (0u8..5).prop_map(RosterOp::Focus),
    ]
}

fn peer(slot: u8) -> ParticipantId {
    ParticipantId::new(format!("peer-{slot}"))
}

fn live_session() -> TestSession {
    let mut session = Session::new(SimEnv::new(), SessionConfig::default());
    session.initialize();
    session
}

proptest! {
    /// Tiles list peers in first-join order, and focus always has a tile.
    #[test]
    fn prop_tiles_track_first_join_order(ops in prop::collection::vec(roster_op_strategy(), 0..60)) {
        let ledger = MediaLedger::new();
        let mut session = live_session();
        let invariants = InvariantRegistry::standard();
        let mut expected: Vec<ParticipantId> = Vec::new();

        for op in &ops {
            match op {
                RosterOp::Join(slot) => {
                    let id = peer(*slot);
                    if !expected.contains(&id) {
                        expected.push(id.clone());
                    }
                    let connection = ledger.connection(id.clone());
                    session.handle(SessionEvent::PeerJoined { id, connection });
                },
                RosterOp::Connect(slot) => {
                    session.handle(SessionEvent::PeerConnected { id: peer(*slot) });
                },
                RosterOp::Close(slot) => {
                    expected.retain(|id| id != &peer(*slot));
                    session.handle(SessionEvent::PeerClosed { id: peer(*slot) });
                },
                RosterOp::Focus(slot) => {
                    session.handle(Intent::SetActiveParticipant(peer(*slot)).into());
                },
            }

            let snapshot = SessionSnapshot::from_session(&session).with_ledger(&ledger);
            let result = invariants.check_all(&snapshot);
            prop_assert!(result.is_ok(), "Invariant violated after {:?}: {:?}", op, result);
        }

        let roster: Vec<ParticipantId> = session.roster().list().cloned().collect();
        prop_assert_eq!(roster, expected);
    }

    /// Focusing the same tile twice restores the previous focus state.
    #[test]
    fn prop_focus_toggle_is_involution(slot in 0u8..3, joined in any::<bool>()) {
        let ledger = MediaLedger::new();
        let mut session = live_session();
        if joined {
            let connection = ledger.connection(peer(slot));
            session.handle(SessionEvent::PeerJoined { id: peer(slot), connection });
        }
        let before = session.active_participant().cloned();

        let first = session.set_active_participant(peer(slot));
        prop_assert_eq!(first.is_empty(), !joined);
        session.set_active_participant(peer(slot));

        prop_assert_eq!(session.active_participant().cloned(), before);
    }

    /// Blank messages never reach the transport; others go out verbatim.
    #[test]
    fn prop_send_only_non_blank(body in "[ a-z\t]{0,12}") {
        let mut session = live_session();

        let actions = session.handle(Intent::SendMessage(body.clone()).into());

        if body.trim().is_empty() {
            prop_assert!(actions.is_empty());
        } else {
            prop_assert_eq!(actions, vec![SessionAction::SendMessage { body }]);
        }
        prop_assert!(session.chat().is_empty());
    }

    /// Received messages are logged in arrival order with dense sequences.
    #[test]
    fn prop_chat_log_in_arrival_order(bodies in prop::collection::vec("[a-z]{1,8}", 0..30)) {
        let mut session = live_session();

        for body in &bodies {
            session.handle(SessionEvent::MessageReceived { sender: peer(0), body: body.clone() });
        }

        let logged: Vec<&str> = session.chat().messages().iter().map(|m| m.body.as_str()).collect();
        let expected: Vec<&str> = bodies.iter().map(String::as_str).collect();
        prop_assert_eq!(logged, expected);
        for (i, message) in session.chat().messages().iter().enumerate() {
            prop_assert_eq!(message.sequence, i as u64);
        }
        prop_assert_eq!(session.view().unread, bodies.len());
    }
}
