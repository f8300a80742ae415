//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use huddle_app::{Session, SessionPhase};
use huddle_core::{Environment, MediaStream, ParticipantId, PeerConnection, StreamKind};

use crate::sim_media::MediaLedger;

/// Snapshot of one rendered tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Participant shown.
    pub id: ParticipantId,
    /// A stream is attached.
    pub has_stream: bool,
    /// Focused.
    pub is_active: bool,
    /// One of the local tiles.
    pub is_local: bool,
    /// Audio muted on playback.
    pub is_muted: bool,
    /// Picture mirrored.
    pub is_mirrored: bool,
}

/// Snapshot of a session's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Roster identifiers in join order.
    pub roster: Vec<ParticipantId>,
    /// Rendered tiles in order.
    pub tiles: Vec<TileSnapshot>,
    /// Focused participant.
    pub active: Option<ParticipantId>,
    /// Registry entries as (owner, kind, stream id), sorted.
    pub streams: Vec<(ParticipantId, StreamKind, String)>,
    /// Chat sequence numbers in log order.
    pub chat_sequences: Vec<u64>,
    /// Live stream ids from the ledger. `None` if not tracked.
    pub live_streams: Option<Vec<String>>,
    /// Peers with a live connection from the ledger. `None` if not tracked.
    pub live_connections: Option<Vec<ParticipantId>>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            roster: Vec::new(),
            tiles: Vec::new(),
            active: None,
            streams: Vec::new(),
            chat_sequences: Vec::new(),
            live_streams: None,
            live_connections: None,
        }
    }
}

impl SessionSnapshot {
    /// Create an empty snapshot (idle, nothing rendered).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture a session.
    pub fn from_session<E, S, C>(session: &Session<E, S, C>) -> Self
    where
        E: Environment,
        S: MediaStream,
        C: PeerConnection,
    {
        let view = session.view();
        let tiles = view
            .tiles
            .iter()
            .map(|tile| TileSnapshot {
                id: tile.id.clone(),
                has_stream: tile.stream.is_some(),
                is_active: tile.is_active,
                is_local: tile.is_local,
                is_muted: tile.is_muted,
                is_mirrored: tile.is_mirrored,
            })
            .collect();

        let mut streams: Vec<_> = session
            .streams()
            .entries()
            .map(|entry| (entry.owner().clone(), entry.kind(), entry.stream().id().to_string()))
            .collect();
        streams.sort();

        Self {
            phase: session.phase(),
            roster: session.roster().list().cloned().collect(),
            tiles,
            active: session.active_participant().cloned(),
            streams,
            chat_sequences: session.chat().messages().iter().map(|m| m.sequence).collect(),
            live_streams: None,
            live_connections: None,
        }
    }

    /// Add the live handles recorded by `ledger`.
    #[must_use]
    pub fn with_ledger(mut self, ledger: &MediaLedger) -> Self {
        self.live_streams = Some(ledger.live_streams());
        self.live_connections = Some(ledger.live_connections());
        self
    }

    /// Tile identifiers in render order.
    pub fn tile_ids(&self) -> Vec<&ParticipantId> {
        self.tiles.iter().map(|tile| &tile.id).collect()
    }
}
