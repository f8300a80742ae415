//! Participant identifiers.
//!
//! A [`ParticipantId`] is an opaque, globally unique string. Two identifiers
//! are reserved for the local user: [`LOCAL_CAMERA`] owns the camera and
//! microphone stream, [`LOCAL_DESKTOP`] owns the desktop-share stream. Every
//! other identifier names a remote peer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved identifier of the local camera/microphone stream.
pub const LOCAL_CAMERA: &str = "_me_";

/// Reserved identifier of the local desktop-share stream.
pub const LOCAL_DESKTOP: &str = "_me_desktop_";

/// Opaque participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved local camera identifier.
    pub fn local_camera() -> Self {
        Self(LOCAL_CAMERA.to_owned())
    }

    /// The reserved local desktop-share identifier.
    pub fn local_desktop() -> Self {
        Self(LOCAL_DESKTOP.to_owned())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for [`LOCAL_CAMERA`].
    pub fn is_local_camera(&self) -> bool {
        self.0 == LOCAL_CAMERA
    }

    /// True for [`LOCAL_DESKTOP`].
    pub fn is_local_desktop(&self) -> bool {
        self.0 == LOCAL_DESKTOP
    }

    /// True for either reserved local identifier.
    ///
    /// Reserved identifiers never appear in the peer roster.
    pub fn is_reserved(&self) -> bool {
        self.is_local_camera() || self.is_local_desktop()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ParticipantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_identifiers() {
        assert!(ParticipantId::local_camera().is_reserved());
        assert!(ParticipantId::local_desktop().is_reserved());
        assert!(ParticipantId::local_camera().is_local_camera());
        assert!(!ParticipantId::local_camera().is_local_desktop());
        assert!(!ParticipantId::from("p1").is_reserved());
    }

    #[test]
    fn display_is_raw_identifier() {
        assert_eq!(ParticipantId::from("peer-7").to_string(), "peer-7");
        assert_eq!(ParticipantId::local_desktop().as_str(), LOCAL_DESKTOP);
    }
}
