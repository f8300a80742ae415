//! Model session - the reference implementation.
//!
//! Tracks only what a user can observe: tiles, focus, chat counters, toolbar
//! toggles and whether the call has ended.

use std::collections::{BTreeSet, VecDeque};

use huddle_core::{LOCAL_CAMERA, LOCAL_DESKTOP};

use super::operation::{Operation, TileTarget, peer_id};

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Tiles in render order as (participant, has stream, is active).
    pub tiles: Vec<(String, bool, bool)>,
    /// Messages in the chat log.
    pub chat_len: usize,
    /// Unread counter.
    pub unread: usize,
    /// Chat panel visible.
    pub chat_visible: bool,
    /// Local user left.
    pub ended: bool,
    /// Microphone enabled.
    pub audio_enabled: bool,
    /// Camera picture enabled.
    pub video_enabled: bool,
}

/// Model session.
#[derive(Debug, Clone)]
pub struct ModelSession {
    /// Remote peers in join order.
    roster: Vec<String>,
    /// Peers with a remote stream, joined or not.
    remote_streams: BTreeSet<String>,
    camera: bool,
    desktop: bool,
    active: Option<String>,
    chat_len: usize,
    unread: usize,
    chat_visible: bool,
    ended: bool,
    audio_enabled: bool,
    video_enabled: bool,
    generation: u64,
    /// Generations of outstanding local media requests, oldest first.
    pending_local: VecDeque<u64>,
    /// Generations of outstanding desktop captures, oldest first.
    pending_desktop: VecDeque<u64>,
}

impl Default for ModelSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSession {
    /// Create an initialized model: live, with one local media request out.
    pub fn new() -> Self {
        Self {
            roster: Vec::new(),
            remote_streams: BTreeSet::new(),
            camera: false,
            desktop: false,
            active: None,
            chat_len: 0,
            unread: 0,
            chat_visible: false,
            ended: false,
            audio_enabled: true,
            video_enabled: true,
            generation: 0,
            pending_local: VecDeque::from([0]),
            pending_desktop: VecDeque::new(),
        }
    }

    /// Whether the model has left the call.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Remote peers in join order.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Apply an operation.
    pub fn apply(&mut self, op: &Operation) {
        // Completions still drain their queue after leave; they are released
        match op {
            Operation::ResolveLocalMedia { granted } => {
                if let Some(issued) = self.pending_local.pop_front()
                    && *granted
                    && issued == self.generation
                    && !self.ended
                {
                    self.camera = true;
                }
                return;
            },
            Operation::ResolveDesktop { granted } => {
                if let Some(issued) = self.pending_desktop.pop_front()
                    && *granted
                    && issued == self.generation
                    && !self.ended
                {
                    self.desktop = true;
                }
                return;
            },
            _ => {},
        }

        if self.ended {
            return;
        }

        match op {
            Operation::PeerJoin { peer } => {
                let id = peer_id(*peer).as_str().to_string();
                if !self.roster.contains(&id) {
                    self.roster.push(id);
                }
            },
            Operation::PeerClose { peer } => {
                let id = peer_id(*peer).as_str().to_string();
                self.remote_streams.remove(&id);
                if let Some(index) = self.roster.iter().position(|p| p == &id) {
                    self.roster.remove(index);
                    if self.active.as_ref() == Some(&id) {
                        self.active = None;
                    }
                }
            },
            Operation::RemoteStreamAttach { peer } => {
                self.remote_streams.insert(peer_id(*peer).as_str().to_string());
            },
            Operation::RemoteStreamDetach { peer } => {
                self.remote_streams.remove(peer_id(*peer).as_str());
            },
            Operation::ReceiveMessage { .. } => self.append_chat(),
            Operation::SendMessage { fail } => {
                if !fail {
                    self.append_chat();
                }
            },
            Operation::ToggleChat => {
                self.chat_visible = !self.chat_visible;
                if self.chat_visible {
                    self.unread = 0;
                }
            },
            Operation::SetActive { target } => self.toggle_active(*target),
            Operation::RequestDesktop => self.pending_desktop.push_back(self.generation),
            Operation::StopDesktop => self.desktop = false,
            Operation::HangUp => {
                self.generation += 1;
                self.camera = false;
                self.desktop = false;
            },
            Operation::ToggleAudio => self.audio_enabled = !self.audio_enabled,
            Operation::ToggleVideo => self.video_enabled = !self.video_enabled,
            Operation::Leave => {
                self.generation += 1;
                self.ended = true;
                self.roster.clear();
                self.remote_streams.clear();
                self.camera = false;
                self.desktop = false;
                self.active = None;
            },
            // Not observable
            Operation::PeerConnect { .. }
            | Operation::PeerError { .. }
            | Operation::Dismiss { .. }
            | Operation::AdvanceTime { .. }
            | Operation::ResolveLocalMedia { .. }
            | Operation::ResolveDesktop { .. } => {},
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let local = [(LOCAL_CAMERA, self.camera), (LOCAL_DESKTOP, self.desktop)];
        let tiles = local
            .into_iter()
            .map(|(id, has_stream)| (id.to_string(), has_stream))
            .chain(self.roster.iter().map(|id| (id.clone(), self.remote_streams.contains(id))))
            .map(|(id, has_stream)| {
                let is_active = self.active.as_ref() == Some(&id);
                (id, has_stream, is_active)
            })
            .collect();

        ObservableState {
            tiles,
            chat_len: self.chat_len,
            unread: self.unread,
            chat_visible: self.chat_visible,
            ended: self.ended,
            audio_enabled: self.audio_enabled,
            video_enabled: self.video_enabled,
        }
    }

    fn append_chat(&mut self) {
        self.chat_len += 1;
        if !self.chat_visible {
            self.unread += 1;
        }
    }

    fn toggle_active(&mut self, target: TileTarget) {
        let id = target.participant().as_str().to_string();
        let has_tile = matches!(target, TileTarget::LocalCamera | TileTarget::LocalDesktop)
            || self.roster.contains(&id);
        if !has_tile {
            return;
        }

        if self.active.as_ref() == Some(&id) {
            self.active = None;
        } else {
            self.active = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_before_peer_shows_once_joined() {
        let mut model = ModelSession::new();
        model.apply(&Operation::RemoteStreamAttach { peer: 1 });
        assert_eq!(model.observable_state().tiles.len(), 2);

        model.apply(&Operation::PeerJoin { peer: 1 });

        let state = model.observable_state();
        assert_eq!(state.tiles[2], ("p1".to_string(), true, false));
    }

    #[test]
    fn stale_grant_after_hang_up_ignored() {
        let mut model = ModelSession::new();
        model.apply(&Operation::RequestDesktop);
        model.apply(&Operation::HangUp);
        model.apply(&Operation::ResolveDesktop { granted: true });
        model.apply(&Operation::ResolveLocalMedia { granted: true });

        let state = model.observable_state();
        assert!(!state.tiles[0].1);
        assert!(!state.tiles[1].1);
    }

    #[test]
    fn leave_is_terminal() {
        let mut model = ModelSession::new();
        model.apply(&Operation::PeerJoin { peer: 0 });
        model.apply(&Operation::Leave);
        model.apply(&Operation::PeerJoin { peer: 2 });
        model.apply(&Operation::ToggleChat);

        let state = model.observable_state();
        assert!(state.ended);
        assert_eq!(state.tiles.len(), 2);
        assert!(!state.chat_visible);
    }

    #[test]
    fn unread_resets_when_panel_opens() {
        let mut model = ModelSession::new();
        model.apply(&Operation::ReceiveMessage { peer: 0 });
        model.apply(&Operation::SendMessage { fail: false });
        model.apply(&Operation::SendMessage { fail: true });
        assert_eq!(model.observable_state().unread, 2);

        model.apply(&Operation::ToggleChat);
        let state = model.observable_state();
        assert_eq!((state.chat_len, state.unread), (2, 0));
    }
}
