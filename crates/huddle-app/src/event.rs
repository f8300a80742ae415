//! Events consumed by the session coordinator.
//!
//! [`Intent`]s come from the presentation layer (the local user). All other
//! [`SessionEvent`] variants come from collaborators: signaling, the local
//! capture collaborator, the chat transport, and the runtime clock.

use huddle_core::{Attachment, CaptureError, NotificationId, ParticipantId};

use crate::CaptureTicket;

/// Local user intents issued by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Show or hide the chat panel.
    ToggleChatPanel,
    /// Focus a tile, or clear focus if it is already active.
    SetActiveParticipant(ParticipantId),
    /// Start sharing the desktop.
    RequestDesktopShare,
    /// Stop sharing the desktop.
    StopDesktopShare,
    /// Release local camera and desktop streams.
    HangUp,
    /// Leave the call entirely.
    Leave,
    /// Remove one notification.
    DismissNotification(NotificationId),
    /// Send a text message.
    SendMessage(String),
    /// Offer a file to the other participants.
    SendFile(Attachment),
    /// Mute or unmute the microphone.
    ToggleAudio,
    /// Turn the camera picture on or off.
    ToggleVideo,
    /// Resume media playback blocked by autoplay policy.
    Play,
}

/// Events processed by [`crate::Session::handle`].
///
/// Generic over the media stream `S` and peer connection `C` handles, which
/// move into the session with the event.
#[derive(Debug)]
pub enum SessionEvent<S, C> {
    /// Local user intent.
    Intent(Intent),

    /// Signaling: a peer joined (or renegotiated) with a new connection.
    PeerJoined {
        /// Peer identifier.
        id: ParticipantId,
        /// Connection handle.
        connection: C,
    },
    /// Signaling: connection to the peer established.
    PeerConnected {
        /// Peer identifier.
        id: ParticipantId,
    },
    /// Signaling: the peer left or its connection dropped.
    PeerClosed {
        /// Peer identifier.
        id: ParticipantId,
    },
    /// Signaling: transport error on a peer connection.
    PeerError {
        /// Peer identifier.
        id: ParticipantId,
        /// Transport error description.
        message: String,
    },
    /// Signaling: a remote media stream became available.
    RemoteStreamAttached {
        /// Owning peer.
        id: ParticipantId,
        /// Stream handle.
        stream: S,
    },
    /// Signaling: the remote media stream went away.
    RemoteStreamDetached {
        /// Owning peer.
        id: ParticipantId,
    },

    /// Chat: message received from a peer.
    MessageReceived {
        /// Sending peer.
        sender: ParticipantId,
        /// Message text.
        body: String,
    },
    /// Chat: file received from a peer.
    FileReceived {
        /// Sending peer.
        sender: ParticipantId,
        /// File metadata.
        attachment: Attachment,
    },
    /// Chat: transport confirmed a local text message.
    MessageSent {
        /// Message text.
        body: String,
    },
    /// Chat: transport confirmed a local file offer.
    FileSent {
        /// File metadata.
        attachment: Attachment,
    },
    /// Chat: transport failed to deliver a local message or file.
    SendFailed {
        /// Failure description.
        reason: String,
    },

    /// Capture: local camera and microphone acquired.
    LocalMediaAcquired {
        /// Ticket from [`crate::SessionAction::AcquireLocalMedia`].
        ticket: CaptureTicket,
        /// Acquired stream.
        stream: S,
    },
    /// Capture: local media acquisition failed.
    LocalMediaFailed {
        /// Ticket from [`crate::SessionAction::AcquireLocalMedia`].
        ticket: CaptureTicket,
        /// Failure reason.
        error: CaptureError,
    },
    /// Capture: desktop capture granted.
    DesktopCaptured {
        /// Ticket from [`crate::SessionAction::CaptureDesktop`].
        ticket: CaptureTicket,
        /// Desktop stream.
        stream: S,
    },
    /// Capture: desktop capture cancelled or refused.
    DesktopCaptureFailed {
        /// Ticket from [`crate::SessionAction::CaptureDesktop`].
        ticket: CaptureTicket,
        /// Failure reason.
        error: CaptureError,
    },

    /// Periodic tick for notification expiry.
    Tick,
}

impl<S, C> From<Intent> for SessionEvent<S, C> {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}
