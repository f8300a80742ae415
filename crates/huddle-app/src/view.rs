//! View model handed to the presentation layer.
//!
//! Derived from session state on demand by [`crate::Session::view`]; never
//! stored. Presentation renders it as a pure function and resolves stream
//! handles by [`StreamId`].

use huddle_core::{NotificationId, NotificationLevel, ParticipantId, StreamId, StreamKind};
use serde::Serialize;

use crate::SessionPhase;

/// Stream shown in a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileStream {
    /// Stream identity.
    pub id: StreamId,
    /// Camera, desktop or remote.
    pub kind: StreamKind,
}

/// One rendered video slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    /// Participant shown in the tile.
    pub id: ParticipantId,
    /// Attached stream. `None` renders a placeholder.
    pub stream: Option<TileStream>,
    /// Focused tile.
    pub is_active: bool,
    /// One of the two local tiles.
    pub is_local: bool,
    /// Audio is not played back (local camera only, avoids echo).
    pub is_muted: bool,
    /// Picture is mirrored (local camera only).
    pub is_mirrored: bool,
}

/// Toolbar button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toolbar {
    /// Local camera stream attached.
    pub camera_on: bool,
    /// Desktop share attached.
    pub desktop_sharing: bool,
    /// Microphone enabled.
    pub audio_enabled: bool,
    /// Camera picture enabled.
    pub video_enabled: bool,
}

/// Active notification as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    /// Identifier for [`crate::Intent::DismissNotification`].
    pub id: NotificationId,
    /// Severity.
    pub level: NotificationLevel,
    /// Text.
    pub message: String,
}

/// Everything presentation needs to draw the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    /// Tiles: local camera, local desktop, then peers in join order.
    pub tiles: Vec<Tile>,
    /// Chat panel shown.
    pub chat_visible: bool,
    /// Messages not yet read.
    pub unread: usize,
    /// Active notifications, oldest first.
    pub notifications: Vec<NotificationView>,
    /// Toolbar state.
    pub toolbar: Toolbar,
    /// Session lifecycle.
    pub phase: SessionPhase,
}

impl ViewModel {
    /// Tile for `id`, if rendered.
    pub fn tile(&self, id: &ParticipantId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| &tile.id == id)
    }

    /// Identifier of the focused tile.
    pub fn active(&self) -> Option<&ParticipantId> {
        self.tiles.iter().find(|tile| tile.is_active).map(|tile| &tile.id)
    }

    /// Tile identifiers in render order.
    pub fn tile_ids(&self) -> Vec<&str> {
        self.tiles.iter().map(|tile| tile.id.as_str()).collect()
    }
}
