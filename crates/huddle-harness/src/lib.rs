//! Deterministic simulation harness for Huddle call sessions.
//!
//! Simulated implementations of the environment, media handles and driver
//! for deterministic, reproducible testing of the session coordinator.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and a [`SimWorld`]
//! wrapping the real session, and their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants.
//!
//! # Release Ledger
//!
//! [`MediaLedger`] tracks every simulated stream and connection, so tests can
//! assert that nothing is live without being owned by the session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod interleave;
pub mod invariants;
pub mod model;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_media;
pub mod sim_world;

pub use interleave::interleave;
pub use invariants::{
    ActiveParticipantHasTile, ChatSequenceIncreasing, EndedSessionReleased, Invariant,
    InvariantRegistry, InvariantResult, LocalCameraOnlyMirrored, NoDanglingMedia,
    ReservedNotInRoster, SessionSnapshot, StreamKindsMatchOwners, TileSnapshot, TilesFollowRoster,
    Violation,
};
pub use model::{
    MAX_PEERS, ModelSession, ObservableState, Operation, PeerSlot, TileTarget, peer_id,
};
pub use sim_driver::{CaptureOutcome, SimDriver, SimDriverError, SimDriverHandle};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_media::{MediaLedger, SimConnection, SimStream};
pub use sim_world::SimWorld;
