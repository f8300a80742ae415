//! Error types for the Huddle session core.
//!
//! Strongly-typed errors per component: media handle failures, capture
//! failures reported by the local capture collaborator, and misuse of the
//! stream registry or peer roster.
//!
//! Release failures ([`MediaError`] from stopping a stream or closing a
//! connection) never leave this crate: the registry and roster log and swallow
//! them.

use thiserror::Error;

use crate::{
    media::{StreamKind, TrackKind},
    participant::ParticipantId,
    roster::PeerState,
};

/// Errors reported by media stream and connection handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Track or stream was already stopped.
    #[error("track already ended")]
    TrackEnded,

    /// Stream carries no track of the requested kind.
    #[error("stream has no {0:?} track")]
    NoSuchTrack(TrackKind),

    /// Underlying device or connection failure.
    #[error("device error: {0}")]
    Device(String),
}

/// Errors reported by the local capture collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// User dismissed the capture prompt.
    #[error("capture cancelled by user")]
    Cancelled,

    /// User or browser refused access to the device.
    #[error("permission denied")]
    PermissionDenied,

    /// Device missing, busy, or the platform lacks capture support.
    #[error("capture unavailable: {0}")]
    Unavailable(String),
}

impl CaptureError {
    /// Returns true if the failure was the user's own decision.
    ///
    /// Cancellation is informational; denial and unavailability are warnings.
    pub fn is_user_decision(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors returned by [`crate::StreamRegistry`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Stream kind does not match its owner (e.g. a camera stream for a peer).
    #[error("{kind:?} stream cannot be owned by {id}")]
    KindMismatch {
        /// Owner the stream was attached under.
        id: ParticipantId,
        /// Kind that was requested.
        kind: StreamKind,
    },

    /// No stream attached for the participant and kind.
    #[error("no {kind:?} stream attached for {id}")]
    NotAttached {
        /// Owner that was looked up.
        id: ParticipantId,
        /// Kind that was looked up.
        kind: StreamKind,
    },

    /// Handle rejected a track operation.
    #[error("media error: {0}")]
    Media(#[from] MediaError),
}

/// Errors returned by [`crate::PeerRoster`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// Reserved local identifiers cannot be peers.
    #[error("reserved identifier {0} cannot join the roster")]
    ReservedIdentifier(ParticipantId),

    /// No roster entry for the identifier.
    #[error("unknown peer {0}")]
    UnknownPeer(ParticipantId),

    /// Transition not allowed by the peer state machine.
    #[error("invalid transition for {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Peer whose state was changed.
        id: ParticipantId,
        /// Current state.
        from: PeerState,
        /// Requested state.
        to: PeerState,
    },
}
