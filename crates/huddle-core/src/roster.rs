//! Peer roster.
//!
//! Tracks the connection handle and lifecycle state of every remote peer, in
//! join order. Join order is the stable tie-break for tile layout.
//!
//! # State Machine
//!
//! ```text
//! ┌────────────┐  mark_connected  ┌───────────┐
//! │ Connecting │─────────────────>│ Connected │
//! └────────────┘                  └───────────┘
//!       │                               │
//!       │ mark_closed (abandoned)       │ mark_closed
//!       ↓                               ↓
//!   ┌────────┐                      ┌────────┐
//!   │ Closed │ ──── removed ─────── │ Closed │
//!   └────────┘                      └────────┘
//! ```
//!
//! Closed is terminal and never observable in the roster: closing a peer
//! closes its connection, detaches every stream it owns from the
//! [`StreamRegistry`], and removes the entry in the same call.

use std::collections::HashMap;

use crate::{
    error::RosterError,
    media::{MediaStream, PeerConnection},
    participant::ParticipantId,
    streams::StreamRegistry,
};

/// Peer connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    /// Signaling started, connection not yet established.
    Connecting,
    /// Connection established.
    Connected,
    /// Connection dropped or torn down.
    Closed,
}

/// A remote peer and its connection.
#[derive(Debug)]
pub struct PeerEntry<C> {
    id: ParticipantId,
    connection: C,
    state: PeerState,
}

impl<C> PeerEntry<C> {
    /// Peer identifier.
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Connection handle.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Current state.
    pub fn state(&self) -> PeerState {
        self.state
    }
}

/// Change recorded by the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterChange {
    /// A new peer joined.
    Joined {
        /// Peer identifier.
        id: ParticipantId,
    },
    /// A known peer renegotiated with a new connection.
    Rejoined {
        /// Peer identifier.
        id: ParticipantId,
    },
    /// Connection established.
    Connected {
        /// Peer identifier.
        id: ParticipantId,
    },
    /// Peer closed and removed.
    Closed {
        /// Peer identifier.
        id: ParticipantId,
        /// State the peer was in when it closed.
        from: PeerState,
    },
}

/// Roster of remote peers in join order.
#[derive(Debug)]
pub struct PeerRoster<C> {
    peers: HashMap<ParticipantId, PeerEntry<C>>,
    /// Join order. Same keys as `peers`.
    order: Vec<ParticipantId>,
    changes: Vec<RosterChange>,
}

impl<C: PeerConnection> Default for PeerRoster<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PeerConnection> PeerRoster<C> {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self { peers: HashMap::new(), order: Vec::new(), changes: Vec::new() }
    }

    /// Insert a peer, or replace the connection of a known one.
    ///
    /// The state becomes [`PeerState::Connecting`] either way. A replaced
    /// connection is closed. A known peer keeps its join position.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::ReservedIdentifier`] for local identifiers. The
    /// rejected connection is closed.
    pub fn upsert(&mut self, id: ParticipantId, connection: C) -> Result<(), RosterError> {
        if id.is_reserved() {
            close(&id, connection);
            return Err(RosterError::ReservedIdentifier(id));
        }

        if let Some(entry) = self.peers.get_mut(&id) {
            let previous = std::mem::replace(&mut entry.connection, connection);
            close(&id, previous);
            entry.state = PeerState::Connecting;
            tracing::debug!(peer = %id, "peer renegotiating");
            self.changes.push(RosterChange::Rejoined { id });
        } else {
            self.order.push(id.clone());
            self.peers.insert(id.clone(), PeerEntry {
                id: id.clone(),
                connection,
                state: PeerState::Connecting,
            });
            tracing::debug!(peer = %id, "peer joined");
            self.changes.push(RosterChange::Joined { id });
        }
        Ok(())
    }

    /// Transition a peer to [`PeerState::Connected`].
    ///
    /// Already connected peers are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UnknownPeer`] if the peer is not in the roster.
    pub fn mark_connected(&mut self, id: &ParticipantId) -> Result<(), RosterError> {
        let entry = self.peers.get_mut(id).ok_or_else(|| RosterError::UnknownPeer(id.clone()))?;

        match entry.state {
            PeerState::Connecting => {
                entry.state = PeerState::Connected;
                tracing::debug!(peer = %id, "peer connected");
                self.changes.push(RosterChange::Connected { id: id.clone() });
                Ok(())
            },
            PeerState::Connected => Ok(()),
            PeerState::Closed => Err(RosterError::InvalidTransition {
                id: id.clone(),
                from: PeerState::Closed,
                to: PeerState::Connected,
            }),
        }
    }

    /// Close a peer: close its connection, detach every stream it owns, and
    /// remove it.
    ///
    /// Streams are detached even when the peer is not in the roster, so a
    /// stream that arrived before its peer never outlives a close. Returns the
    /// state the peer was in, or `None` if it was unknown.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::ReservedIdentifier`] for local identifiers. Local
    /// streams are left attached.
    pub fn mark_closed<S: MediaStream>(
        &mut self,
        id: &ParticipantId,
        streams: &mut StreamRegistry<S>,
    ) -> Result<Option<PeerState>, RosterError> {
        if id.is_reserved() {
            return Err(RosterError::ReservedIdentifier(id.clone()));
        }

        let detached = streams.detach(id, None);
        let Some(entry) = self.take(id) else {
            return Ok(None);
        };
        let from = entry.state;
        close(id, entry.connection);

        tracing::debug!(peer = %id, ?from, detached, "peer closed");
        self.changes.push(RosterChange::Closed { id: id.clone(), from });
        Ok(Some(from))
    }

    /// Close every peer. Returns the number closed.
    pub fn close_all<S: MediaStream>(&mut self, streams: &mut StreamRegistry<S>) -> usize {
        let ids = self.order.clone();
        ids.iter().filter(|id| matches!(self.mark_closed(id, streams), Ok(Some(_)))).count()
    }

    /// Remove a peer outright without closing it. Idempotent.
    ///
    /// Returns the removed entry so the caller decides what happens to the
    /// connection.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<PeerEntry<C>> {
        self.take(id)
    }

    /// Close a connection that never entered the roster.
    ///
    /// Used for peers that signal after the session ended.
    pub fn discard(&self, id: &ParticipantId, connection: C) {
        tracing::debug!(peer = %id, "discarding connection");
        close(id, connection);
    }

    /// Peer entry. `None` if unknown.
    pub fn get(&self, id: &ParticipantId) -> Option<&PeerEntry<C>> {
        self.peers.get(id)
    }

    /// Whether the peer is in the roster.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.peers.contains_key(id)
    }

    /// Peer state. `None` if unknown.
    pub fn state(&self, id: &ParticipantId) -> Option<PeerState> {
        self.peers.get(id).map(PeerEntry::state)
    }

    /// Peer identifiers in join order.
    ///
    /// The iterator is lazy and can be restarted by cloning it.
    pub fn list(&self) -> impl Iterator<Item = &ParticipantId> + Clone + '_ {
        self.order.iter()
    }

    /// Number of peers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no peers.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drain the changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<RosterChange> {
        std::mem::take(&mut self.changes)
    }

    fn take(&mut self, id: &ParticipantId) -> Option<PeerEntry<C>> {
        let entry = self.peers.remove(id)?;
        self.order.retain(|p| p != id);
        Some(entry)
    }
}

/// Close a connection, logging instead of surfacing failures.
fn close<C: PeerConnection>(id: &ParticipantId, mut connection: C) {
    if let Err(error) = connection.close() {
        tracing::warn!(peer = %id, %error, "connection close failed, treating as closed");
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{
        error::MediaError,
        media::{StreamId, StreamKind, TrackKind},
    };

    #[derive(Debug, Default)]
    struct FakeConnection {
        closes: Rc<Cell<usize>>,
    }

    impl PeerConnection for FakeConnection {
        fn close(&mut self) -> Result<(), MediaError> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FakeStream(StreamId);

    impl MediaStream for FakeStream {
        fn id(&self) -> &StreamId {
            &self.0
        }

        fn stop(&mut self) -> Result<(), MediaError> {
            Ok(())
        }

        fn set_track_enabled(&mut self, _track: TrackKind, _enabled: bool) -> Result<(), MediaError> {
            Ok(())
        }
    }

    fn ids(roster: &PeerRoster<FakeConnection>) -> Vec<&str> {
        roster.list().map(ParticipantId::as_str).collect()
    }

    #[test]
    fn list_preserves_join_order_on_upsert() {
        let mut roster = PeerRoster::new();
        roster.upsert("p1".into(), FakeConnection::default()).unwrap();
        roster.upsert("p2".into(), FakeConnection::default()).unwrap();
        roster.upsert("p1".into(), FakeConnection::default()).unwrap();

        assert_eq!(ids(&roster), vec!["p1", "p2"]);
    }

    #[test]
    fn list_is_restartable() {
        let mut roster = PeerRoster::new();
        roster.upsert("a".into(), FakeConnection::default()).unwrap();
        roster.upsert("b".into(), FakeConnection::default()).unwrap();

        let iter = roster.list();
        assert_eq!(iter.clone().count(), 2);
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn upsert_closes_replaced_connection() {
        let closes = Rc::new(Cell::new(0));
        let mut roster = PeerRoster::new();
        roster.upsert("p1".into(), FakeConnection { closes: Rc::clone(&closes) }).unwrap();
        roster.mark_connected(&"p1".into()).unwrap();

        roster.upsert("p1".into(), FakeConnection::default()).unwrap();

        assert_eq!(closes.get(), 1);
        assert_eq!(roster.state(&"p1".into()), Some(PeerState::Connecting));
    }

    #[test]
    fn reserved_identifiers_rejected() {
        let mut roster = PeerRoster::new();
        let result = roster.upsert(ParticipantId::local_camera(), FakeConnection::default());

        assert_eq!(result, Err(RosterError::ReservedIdentifier(ParticipantId::local_camera())));
        assert!(roster.is_empty());
    }

    #[test]
    fn mark_connected_unknown_peer() {
        let mut roster: PeerRoster<FakeConnection> = PeerRoster::new();
        assert_eq!(
            roster.mark_connected(&"nobody".into()),
            Err(RosterError::UnknownPeer("nobody".into()))
        );
    }

    #[test]
    fn mark_closed_detaches_streams_and_removes() {
        let closes = Rc::new(Cell::new(0));
        let mut roster = PeerRoster::new();
        let mut streams = StreamRegistry::new();
        roster.upsert("p1".into(), FakeConnection { closes: Rc::clone(&closes) }).unwrap();
        streams.attach("p1".into(), StreamKind::Remote, FakeStream("s1".into())).unwrap();

        assert_eq!(roster.mark_closed(&"p1".into(), &mut streams), Ok(Some(PeerState::Connecting)));

        assert!(!roster.contains(&"p1".into()));
        assert!(!streams.contains(&"p1".into()));
        assert_eq!(closes.get(), 1);
        assert_eq!(roster.take_changes().last(), Some(&RosterChange::Closed {
            id: "p1".into(),
            from: PeerState::Connecting
        }));
    }

    #[test]
    fn mark_closed_unknown_still_detaches_orphan_stream() {
        let mut roster: PeerRoster<FakeConnection> = PeerRoster::new();
        let mut streams = StreamRegistry::new();
        streams.attach("early".into(), StreamKind::Remote, FakeStream("s".into())).unwrap();

        assert_eq!(roster.mark_closed(&"early".into(), &mut streams), Ok(None));
        assert!(streams.is_empty());
    }

    #[test]
    fn mark_closed_reserved_keeps_local_streams() {
        let mut roster: PeerRoster<FakeConnection> = PeerRoster::new();
        let mut streams = StreamRegistry::new();
        let camera = ParticipantId::local_camera();
        streams.attach(camera.clone(), StreamKind::Camera, FakeStream("cam".into())).unwrap();

        assert_eq!(
            roster.mark_closed(&camera, &mut streams),
            Err(RosterError::ReservedIdentifier(camera.clone()))
        );
        assert!(streams.get(&camera, StreamKind::Camera).is_some());
        assert!(roster.take_changes().is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut roster = PeerRoster::new();
        roster.upsert("p1".into(), FakeConnection::default()).unwrap();

        assert!(roster.remove(&"p1".into()).is_some());
        assert!(roster.remove(&"p1".into()).is_none());
        assert!(roster.is_empty());
    }
}
