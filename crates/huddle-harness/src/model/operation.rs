//! Operations for model-based testing.
//!
//! Operations represent everything that can happen to a session: remote
//! peers, capture collaborators, the chat transport and the local user. They
//! are generated by proptest or the fuzzer and applied to both the model and
//! the real session.

use arbitrary::Arbitrary;
use huddle_core::ParticipantId;

/// Remote peer slot. Mapped onto [`MAX_PEERS`] distinct identifiers.
pub type PeerSlot = u8;

/// Number of distinct remote peers operations can address.
pub const MAX_PEERS: u8 = 4;

/// Identifier of the remote peer in `slot`.
pub fn peer_id(slot: PeerSlot) -> ParticipantId {
    ParticipantId::new(format!("p{}", slot % MAX_PEERS))
}

/// Tile a focus operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum TileTarget {
    /// Local camera tile.
    LocalCamera,
    /// Local desktop tile.
    LocalDesktop,
    /// A remote peer, whether or not it has a tile.
    Peer(PeerSlot),
}

impl TileTarget {
    /// Participant identifier of the target.
    pub fn participant(self) -> ParticipantId {
        match self {
            Self::LocalCamera => ParticipantId::local_camera(),
            Self::LocalDesktop => ParticipantId::local_desktop(),
            Self::Peer(slot) => peer_id(slot),
        }
    }
}

/// Operations that can be applied to a session.
///
/// Capture requests and their completions are separate operations so that
/// hang-up and leave can land between them.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Signaling announces a peer (new or renegotiating).
    PeerJoin {
        /// Peer joining.
        peer: PeerSlot,
    },

    /// Peer connection reaches the connected state.
    PeerConnect {
        /// Peer connected.
        peer: PeerSlot,
    },

    /// Peer connection closes.
    PeerClose {
        /// Peer closed.
        peer: PeerSlot,
    },

    /// Peer connection reports an error.
    PeerError {
        /// Peer in trouble.
        peer: PeerSlot,
    },

    /// A remote stream arrives for a peer, possibly before the peer itself.
    RemoteStreamAttach {
        /// Owning peer.
        peer: PeerSlot,
    },

    /// A remote stream ends.
    RemoteStreamDetach {
        /// Owning peer.
        peer: PeerSlot,
    },

    /// Chat message from a peer.
    ReceiveMessage {
        /// Sender.
        peer: PeerSlot,
    },

    /// Local user sends a message; the transport accepts or rejects it.
    SendMessage {
        /// Transport rejects the message.
        fail: bool,
    },

    /// Show or hide the chat panel.
    ToggleChat,

    /// Focus or unfocus a tile.
    SetActive {
        /// Tile to toggle.
        target: TileTarget,
    },

    /// Ask for a desktop capture.
    RequestDesktop,

    /// Complete the oldest pending desktop capture.
    ResolveDesktop {
        /// User granted the capture.
        granted: bool,
    },

    /// Complete the oldest pending local media request.
    ResolveLocalMedia {
        /// User granted camera and microphone.
        granted: bool,
    },

    /// Stop sharing the desktop.
    StopDesktop,

    /// Release local media, keep peers.
    HangUp,

    /// Mute or unmute the microphone.
    ToggleAudio,

    /// Turn the camera picture on or off.
    ToggleVideo,

    /// Dismiss one of the active notifications.
    Dismiss {
        /// Picks an active notification modulo their count.
        index: u8,
    },

    /// Advance simulated time, then tick.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Leave the call.
    Leave,
}
