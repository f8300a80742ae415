//! Stream registry.
//!
//! Maps a participant to its attached media streams and owns their lifetime.
//! No other component releases a media handle: replacing, detaching and
//! discarding all go through [`StreamRegistry`], which stops the handle and
//! swallows release failures.
//!
//! Every mutation that changes what is attached records a [`StreamChange`].
//! The session coordinator drains them with
//! [`StreamRegistry::take_changes`]. Calls that change nothing record nothing.

use std::collections::{HashMap, hash_map::Entry};

use crate::{
    error::RegistryError,
    media::{MediaStream, StreamKind, TrackKind},
    participant::ParticipantId,
};

/// An attached stream and its owner.
#[derive(Debug)]
pub struct StreamEntry<S> {
    owner: ParticipantId,
    kind: StreamKind,
    stream: S,
}

impl<S: MediaStream> StreamEntry<S> {
    /// Participant that owns the stream.
    pub fn owner(&self) -> &ParticipantId {
        &self.owner
    }

    /// Kind of the stream.
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// The stream handle.
    pub fn stream(&self) -> &S {
        &self.stream
    }
}

/// Change recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChange {
    /// A stream was attached where none was.
    Attached {
        /// Owner of the stream.
        id: ParticipantId,
        /// Kind of the stream.
        kind: StreamKind,
    },
    /// A different stream replaced the previous one, which was released.
    Replaced {
        /// Owner of the stream.
        id: ParticipantId,
        /// Kind of the stream.
        kind: StreamKind,
    },
    /// The stream was removed and released.
    Detached {
        /// Owner of the stream.
        id: ParticipantId,
        /// Kind of the stream.
        kind: StreamKind,
    },
}

/// Registry of attached media streams.
///
/// At most one entry exists per (participant, kind).
#[derive(Debug)]
pub struct StreamRegistry<S> {
    entries: HashMap<(ParticipantId, StreamKind), StreamEntry<S>>,
    changes: Vec<StreamChange>,
}

impl<S: MediaStream> Default for StreamRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MediaStream> StreamRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { entries: HashMap::new(), changes: Vec::new() }
    }

    /// Attach `stream` for `(id, kind)`.
    ///
    /// If a different stream is attached for the pair, it is released before
    /// the new one is stored. Attaching the stream that is already attached
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::KindMismatch`] if `kind` cannot be owned by
    /// `id`. The rejected stream is released.
    pub fn attach(
        &mut self,
        id: ParticipantId,
        kind: StreamKind,
        stream: S,
    ) -> Result<(), RegistryError> {
        if !kind.is_valid_for(&id) {
            release(&id, kind, stream);
            return Err(RegistryError::KindMismatch { id, kind });
        }

        match self.entries.entry((id.clone(), kind)) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().stream.id() == stream.id() {
                    tracing::debug!(participant = %id, ?kind, "stream already attached");
                    return Ok(());
                }
                let previous = std::mem::replace(&mut occupied.get_mut().stream, stream);
                release(&id, kind, previous);
                tracing::debug!(participant = %id, ?kind, "stream replaced");
                self.changes.push(StreamChange::Replaced { id, kind });
            },
            Entry::Vacant(vacant) => {
                vacant.insert(StreamEntry { owner: id.clone(), kind, stream });
                tracing::debug!(participant = %id, ?kind, "stream attached");
                self.changes.push(StreamChange::Attached { id, kind });
            },
        }
        Ok(())
    }

    /// Detach and release the stream of `kind` for `id`, or every stream of
    /// `id` when `kind` is `None`.
    ///
    /// Returns the number of streams released. Detaching nothing is not an
    /// error and records no change.
    pub fn detach(&mut self, id: &ParticipantId, kind: Option<StreamKind>) -> usize {
        let mut released = 0;
        for candidate in StreamKind::ALL {
            if kind.is_some_and(|k| k != candidate) {
                continue;
            }
            if let Some(entry) = self.entries.remove(&(id.clone(), candidate)) {
                release(&entry.owner, entry.kind, entry.stream);
                self.changes.push(StreamChange::Detached { id: id.clone(), kind: candidate });
                released += 1;
            }
        }
        released
    }

    /// Detach and release every stream.
    pub fn detach_all(&mut self) -> usize {
        let keys: Vec<_> = self.entries.keys().cloned().collect();
        let mut released = 0;
        for (id, kind) in keys {
            released += self.detach(&id, Some(kind));
        }
        released
    }

    /// Release a stream that never entered the registry.
    ///
    /// Used for capture completions that arrive after the session moved on.
    pub fn discard(&self, owner: &ParticipantId, stream: S) {
        let kind = StreamKind::for_owner(owner);
        tracing::debug!(participant = %owner, ?kind, stream = %stream.id(), "discarding stream");
        release(owner, kind, stream);
    }

    /// Current stream for `(id, kind)`. `None` if nothing is attached.
    pub fn get(&self, id: &ParticipantId, kind: StreamKind) -> Option<&S> {
        self.entries.get(&(id.clone(), kind)).map(|entry| &entry.stream)
    }

    /// The stream a tile for `id` shows: camera, desktop or remote by owner.
    pub fn get_for(&self, id: &ParticipantId) -> Option<&S> {
        self.get(id, StreamKind::for_owner(id))
    }

    /// Whether any stream is attached for `id`.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        StreamKind::ALL.iter().any(|kind| self.entries.contains_key(&(id.clone(), *kind)))
    }

    /// Enable or disable a track of an attached stream.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotAttached`] if no stream is attached, or
    /// [`RegistryError::Media`] if the stream rejects the change.
    pub fn set_track_enabled(
        &mut self,
        id: &ParticipantId,
        kind: StreamKind,
        track: TrackKind,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(&(id.clone(), kind))
            .ok_or_else(|| RegistryError::NotAttached { id: id.clone(), kind })?;
        entry.stream.set_track_enabled(track, enabled)?;
        Ok(())
    }

    /// All attached entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &StreamEntry<S>> {
        self.entries.values()
    }

    /// Number of attached streams.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no stream is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain the changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<StreamChange> {
        std::mem::take(&mut self.changes)
    }
}

/// Stop a stream, logging instead of surfacing failures.
fn release<S: MediaStream>(owner: &ParticipantId, kind: StreamKind, mut stream: S) {
    match stream.stop() {
        Ok(()) => {
            tracing::debug!(participant = %owner, ?kind, stream = %stream.id(), "stream released");
        },
        Err(error) => {
            tracing::warn!(
                participant = %owner,
                ?kind,
                stream = %stream.id(),
                %error,
                "stream release failed, treating as released"
            );
        },
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{error::MediaError, media::StreamId};

    #[derive(Debug)]
    struct FakeStream {
        id: StreamId,
        stopped: Rc<RefCell<Vec<StreamId>>>,
        fail_stop: bool,
    }

    impl FakeStream {
        fn new(id: &str, stopped: &Rc<RefCell<Vec<StreamId>>>) -> Self {
            Self { id: id.into(), stopped: Rc::clone(stopped), fail_stop: false }
        }
    }

    impl MediaStream for FakeStream {
        fn id(&self) -> &StreamId {
            &self.id
        }

        fn stop(&mut self) -> Result<(), MediaError> {
            self.stopped.borrow_mut().push(self.id.clone());
            if self.fail_stop { Err(MediaError::TrackEnded) } else { Ok(()) }
        }

        fn set_track_enabled(&mut self, _track: TrackKind, _enabled: bool) -> Result<(), MediaError> {
            Ok(())
        }
    }

    fn camera() -> ParticipantId {
        ParticipantId::local_camera()
    }

    #[test]
    fn attach_replaces_and_releases_previous() {
        let stopped = Rc::default();
        let mut registry = StreamRegistry::new();

        registry.attach(camera(), StreamKind::Camera, FakeStream::new("a", &stopped)).unwrap();
        registry.attach(camera(), StreamKind::Camera, FakeStream::new("b", &stopped)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&camera(), StreamKind::Camera).map(|s| s.id.as_str()), Some("b"));
        assert_eq!(*stopped.borrow(), vec![StreamId::from("a")]);
        assert_eq!(registry.take_changes(), vec![
            StreamChange::Attached { id: camera(), kind: StreamKind::Camera },
            StreamChange::Replaced { id: camera(), kind: StreamKind::Camera },
        ]);
    }

    #[test]
    fn reattaching_same_handle_is_silent() {
        let stopped = Rc::default();
        let mut registry = StreamRegistry::new();

        registry.attach(camera(), StreamKind::Camera, FakeStream::new("a", &stopped)).unwrap();
        let _ = registry.take_changes();
        registry.attach(camera(), StreamKind::Camera, FakeStream::new("a", &stopped)).unwrap();

        assert!(stopped.borrow().is_empty());
        assert!(registry.take_changes().is_empty());
    }

    #[test]
    fn attach_rejects_kind_mismatch() {
        let stopped = Rc::default();
        let mut registry = StreamRegistry::new();

        let result = registry.attach("p1".into(), StreamKind::Camera, FakeStream::new("a", &stopped));

        assert_eq!(result, Err(RegistryError::KindMismatch {
            id: "p1".into(),
            kind: StreamKind::Camera
        }));
        assert!(registry.is_empty());
        assert_eq!(stopped.borrow().len(), 1, "rejected stream must be released");
    }

    #[test]
    fn detach_missing_is_noop() {
        let mut registry: StreamRegistry<FakeStream> = StreamRegistry::new();
        let id = ParticipantId::from("ghost");

        assert_eq!(registry.detach(&id, None), 0);
        assert_eq!(registry.detach(&id, None), 0);
        assert!(registry.take_changes().is_empty());
    }

    #[test]
    fn detach_swallows_release_failure() {
        let stopped = Rc::default();
        let mut registry = StreamRegistry::new();
        let mut stream = FakeStream::new("gone", &stopped);
        stream.fail_stop = true;

        registry.attach("p1".into(), StreamKind::Remote, stream).unwrap();
        assert_eq!(registry.detach(&"p1".into(), Some(StreamKind::Remote)), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn detach_with_kind_keeps_other_kinds() {
        let stopped = Rc::default();
        let mut registry = StreamRegistry::new();
        registry.attach(camera(), StreamKind::Camera, FakeStream::new("cam", &stopped)).unwrap();
        registry
            .attach(ParticipantId::local_desktop(), StreamKind::Desktop, FakeStream::new("desk", &stopped))
            .unwrap();

        assert_eq!(registry.detach(&camera(), Some(StreamKind::Desktop)), 0);
        assert_eq!(registry.detach(&camera(), Some(StreamKind::Camera)), 1);
        assert!(registry.get_for(&ParticipantId::local_desktop()).is_some());
    }

    #[test]
    fn set_track_enabled_requires_stream() {
        let mut registry: StreamRegistry<FakeStream> = StreamRegistry::new();
        let result = registry.set_track_enabled(&camera(), StreamKind::Camera, TrackKind::Audio, false);
        assert_eq!(result, Err(RegistryError::NotAttached { id: camera(), kind: StreamKind::Camera }));
    }
}
