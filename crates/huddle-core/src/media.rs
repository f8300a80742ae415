//! Media collaborator contracts.
//!
//! The real-time media stack (capture devices, codec negotiation, NAT
//! traversal) lives outside this crate. The session only needs two narrow
//! handles from it: a [`MediaStream`] it can identify and stop, and a
//! [`PeerConnection`] it can close.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::MediaError, participant::ParticipantId};

/// Stable identifier of a media stream handle.
///
/// Two handles with the same id refer to the same underlying stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Wrap a stream identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of an attached stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StreamKind {
    /// Local camera and microphone.
    Camera,
    /// Local desktop share.
    Desktop,
    /// Stream received from a remote peer.
    Remote,
}

impl StreamKind {
    /// Every kind, in tile order.
    pub const ALL: [StreamKind; 3] = [StreamKind::Camera, StreamKind::Desktop, StreamKind::Remote];

    /// Whether a stream of this kind may be owned by `owner`.
    ///
    /// Camera streams belong to [`crate::LOCAL_CAMERA`], desktop streams to
    /// [`crate::LOCAL_DESKTOP`], remote streams to any non-reserved id.
    pub fn is_valid_for(self, owner: &ParticipantId) -> bool {
        match self {
            Self::Camera => owner.is_local_camera(),
            Self::Desktop => owner.is_local_desktop(),
            Self::Remote => !owner.is_reserved(),
        }
    }

    /// The kind a stream owned by `owner` must have.
    pub fn for_owner(owner: &ParticipantId) -> Self {
        if owner.is_local_camera() {
            Self::Camera
        } else if owner.is_local_desktop() {
            Self::Desktop
        } else {
            Self::Remote
        }
    }
}

/// Track inside a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Microphone or remote audio.
    Audio,
    /// Camera, screen or remote video.
    Video,
}

/// A live media stream handle.
///
/// Stopping a stream ends all of its tracks and releases the capture device.
/// Implementations may fail when the device is already gone; callers treat
/// such failures as already released.
pub trait MediaStream: fmt::Debug {
    /// Identity of the underlying stream.
    fn id(&self) -> &StreamId;

    /// Stop every track of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if a track or device is already gone.
    fn stop(&mut self) -> Result<(), MediaError>;

    /// Enable or disable every track of the given kind without stopping it.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::NoSuchTrack`] if the stream carries no such track.
    fn set_track_enabled(&mut self, track: TrackKind, enabled: bool) -> Result<(), MediaError>;
}

/// A real-time connection to one remote peer.
pub trait PeerConnection: fmt::Debug {
    /// Close the connection and release its transport resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection was already torn down.
    fn close(&mut self) -> Result<(), MediaError>;
}
