//! Simulated media streams and peer connections.
//!
//! Every handle is created through a [`MediaLedger`], which records which
//! streams and connections are still live. Releasing a handle twice is an
//! error, matching a browser track that is already ended.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use huddle_core::{MediaError, MediaStream, ParticipantId, PeerConnection, StreamId, TrackKind};

#[derive(Debug, Default)]
struct LedgerState {
    live_streams: BTreeSet<String>,
    stopped_streams: Vec<String>,
    double_releases: usize,
    live_connections: BTreeMap<u64, ParticipantId>,
    next_connection: u64,
    closed_connections: usize,
}

/// Shared record of live simulated handles.
#[derive(Debug, Clone, Default)]
pub struct MediaLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MediaLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a live stream with audio and video tracks.
    pub fn stream(&self, id: impl Into<String>) -> SimStream {
        self.create_stream(id.into(), true)
    }

    /// Create a live stream with only a video track (a desktop capture).
    pub fn video_only_stream(&self, id: impl Into<String>) -> SimStream {
        self.create_stream(id.into(), false)
    }

    /// Open a live connection to `peer`.
    pub fn connection(&self, peer: impl Into<ParticipantId>) -> SimConnection {
        let peer = peer.into();
        let mut state = self.lock();
        let serial = state.next_connection;
        state.next_connection += 1;
        state.live_connections.insert(serial, peer.clone());
        SimConnection { serial, peer, ledger: self.clone() }
    }

    /// Whether the stream is live.
    pub fn is_stream_live(&self, id: &str) -> bool {
        self.lock().live_streams.contains(id)
    }

    /// Live stream ids, sorted.
    pub fn live_streams(&self) -> Vec<String> {
        self.lock().live_streams.iter().cloned().collect()
    }

    /// Stopped stream ids, in stop order.
    pub fn stopped_streams(&self) -> Vec<String> {
        self.lock().stopped_streams.clone()
    }

    /// Peers with a live connection, sorted. A peer appears once per live
    /// connection.
    pub fn live_connections(&self) -> Vec<ParticipantId> {
        let mut peers: Vec<_> = self.lock().live_connections.values().cloned().collect();
        peers.sort();
        peers
    }

    /// Number of connections closed so far.
    pub fn closed_connections(&self) -> usize {
        self.lock().closed_connections
    }

    /// Releases of handles that were already released.
    pub fn double_releases(&self) -> usize {
        self.lock().double_releases
    }

    fn create_stream(&self, id: String, has_audio: bool) -> SimStream {
        self.lock().live_streams.insert(id.clone());
        SimStream {
            id: StreamId::new(id),
            ledger: self.clone(),
            audio: has_audio.then_some(true),
            video: true,
        }
    }

    fn stop_stream(&self, id: &str) -> bool {
        let mut state = self.lock();
        if state.live_streams.remove(id) {
            state.stopped_streams.push(id.to_string());
            true
        } else {
            state.double_releases += 1;
            false
        }
    }

    fn close_connection(&self, serial: u64) -> bool {
        let mut state = self.lock();
        if state.live_connections.remove(&serial).is_some() {
            state.closed_connections += 1;
            true
        } else {
            state.double_releases += 1;
            false
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Simulated media stream.
#[derive(Debug)]
pub struct SimStream {
    id: StreamId,
    ledger: MediaLedger,
    /// `None` if the stream has no audio track.
    audio: Option<bool>,
    video: bool,
}

impl SimStream {
    /// Whether a track is enabled. `false` for a missing track.
    pub fn track_enabled(&self, track: TrackKind) -> bool {
        match track {
            TrackKind::Audio => self.audio.unwrap_or(false),
            TrackKind::Video => self.video,
        }
    }
}

impl MediaStream for SimStream {
    fn id(&self) -> &StreamId {
        &self.id
    }

    fn stop(&mut self) -> Result<(), MediaError> {
        if self.ledger.stop_stream(self.id.as_str()) { Ok(()) } else { Err(MediaError::TrackEnded) }
    }

    fn set_track_enabled(&mut self, track: TrackKind, enabled: bool) -> Result<(), MediaError> {
        match track {
            TrackKind::Audio => match self.audio.as_mut() {
                Some(audio) => *audio = enabled,
                None => return Err(MediaError::NoSuchTrack(track)),
            },
            TrackKind::Video => self.video = enabled,
        }
        Ok(())
    }
}

/// Simulated peer connection.
#[derive(Debug)]
pub struct SimConnection {
    serial: u64,
    peer: ParticipantId,
    ledger: MediaLedger,
}

impl SimConnection {
    /// Peer at the other end.
    pub fn peer(&self) -> &ParticipantId {
        &self.peer
    }
}

impl PeerConnection for SimConnection {
    fn close(&mut self) -> Result<(), MediaError> {
        if self.ledger.close_connection(self.serial) {
            Ok(())
        } else {
            Err(MediaError::Device(format!("connection to {} already closed", self.peer)))
        }
    }
}
