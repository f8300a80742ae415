//! Reference model for model-based testing.
//!
//! [`ModelSession`] is a plain-data rendition of the session coordinator:
//! no media handles, no notifications, no time. It is the oracle the real
//! session (wrapped in [`crate::SimWorld`]) is compared against through
//! [`ObservableState`].

mod operation;
mod session;

pub use operation::{MAX_PEERS, Operation, PeerSlot, TileTarget, peer_id};
pub use session::{ModelSession, ObservableState};
