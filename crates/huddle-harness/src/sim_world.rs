//! Real session wrapped for operation-driven testing.
//!
//! [`SimWorld`] drives a [`Session`] with [`Operation`]s the same way
//! [`crate::ModelSession`] consumes them, standing in for every collaborator:
//! signaling, capture, the chat transport and the clock. All handles come
//! from one [`MediaLedger`], so snapshots can check for leaks.

use std::{collections::VecDeque, time::Duration};

use huddle_app::{CaptureTicket, Intent, Session, SessionAction, SessionConfig, SessionEvent};
use huddle_core::{CaptureError, MediaStream};

use crate::{
    SessionSnapshot,
    model::{ObservableState, Operation, peer_id},
    sim_env::SimEnv,
    sim_media::{MediaLedger, SimConnection, SimStream},
};

/// Body of every message the local user sends.
const SENT_BODY: &str = "hello";

/// Real session plus simulated collaborators.
#[derive(Debug)]
pub struct SimWorld {
    session: Session<SimEnv, SimStream, SimConnection>,
    env: SimEnv,
    ledger: MediaLedger,
    pending_local: VecDeque<CaptureTicket>,
    pending_desktop: VecDeque<CaptureTicket>,
    next_stream: u64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// Create an initialized session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create an initialized session.
    pub fn with_config(config: SessionConfig) -> Self {
        let env = SimEnv::new();
        let session = Session::new(env.clone(), config);
        let mut world = Self {
            session,
            env,
            ledger: MediaLedger::new(),
            pending_local: VecDeque::new(),
            pending_desktop: VecDeque::new(),
            next_stream: 0,
        };
        let actions = world.session.initialize();
        world.track(&actions);
        world
    }

    /// Apply an operation and return the session's actions.
    pub fn apply(&mut self, op: &Operation) -> Vec<SessionAction> {
        let actions = match op {
            Operation::PeerJoin { peer } => {
                let id = peer_id(*peer);
                let connection = self.ledger.connection(id.clone());
                self.session.handle(SessionEvent::PeerJoined { id, connection })
            },
            Operation::PeerConnect { peer } => {
                self.session.handle(SessionEvent::PeerConnected { id: peer_id(*peer) })
            },
            Operation::PeerClose { peer } => {
                self.session.handle(SessionEvent::PeerClosed { id: peer_id(*peer) })
            },
            Operation::PeerError { peer } => self.session.handle(SessionEvent::PeerError {
                id: peer_id(*peer),
                message: "ice failed".into(),
            }),
            Operation::RemoteStreamAttach { peer } => {
                let id = peer_id(*peer);
                let stream = self.fresh_stream(id.as_str(), true);
                self.session.handle(SessionEvent::RemoteStreamAttached { id, stream })
            },
            Operation::RemoteStreamDetach { peer } => {
                self.session.handle(SessionEvent::RemoteStreamDetached { id: peer_id(*peer) })
            },
            Operation::ReceiveMessage { peer } => {
                self.session.handle(SessionEvent::MessageReceived {
                    sender: peer_id(*peer),
                    body: format!("hi from {}", peer_id(*peer)),
                })
            },
            Operation::SendMessage { fail } => self.send_message(*fail),
            Operation::ToggleChat => self.intent(Intent::ToggleChatPanel),
            Operation::SetActive { target } => {
                self.intent(Intent::SetActiveParticipant(target.participant()))
            },
            Operation::RequestDesktop => self.intent(Intent::RequestDesktopShare),
            Operation::ResolveDesktop { granted } => match self.pending_desktop.pop_front() {
                Some(ticket) if *granted => {
                    let stream = self.fresh_stream("desktop", false);
                    self.session.handle(SessionEvent::DesktopCaptured { ticket, stream })
                },
                Some(ticket) => self.session.handle(SessionEvent::DesktopCaptureFailed {
                    ticket,
                    error: CaptureError::Cancelled,
                }),
                None => vec![],
            },
            Operation::ResolveLocalMedia { granted } => match self.pending_local.pop_front() {
                Some(ticket) if *granted => {
                    let stream = self.fresh_stream("camera", true);
                    self.session.handle(SessionEvent::LocalMediaAcquired { ticket, stream })
                },
                Some(ticket) => self.session.handle(SessionEvent::LocalMediaFailed {
                    ticket,
                    error: CaptureError::PermissionDenied,
                }),
                None => vec![],
            },
            Operation::StopDesktop => self.intent(Intent::StopDesktopShare),
            Operation::HangUp => self.intent(Intent::HangUp),
            Operation::ToggleAudio => self.intent(Intent::ToggleAudio),
            Operation::ToggleVideo => self.intent(Intent::ToggleVideo),
            Operation::Dismiss { index } => {
                let view = self.session.view();
                if view.notifications.is_empty() {
                    return vec![];
                }
                let target = &view.notifications[usize::from(*index) % view.notifications.len()];
                self.intent(Intent::DismissNotification(target.id))
            },
            Operation::AdvanceTime { millis } => {
                self.env.advance(Duration::from_millis(u64::from(*millis)));
                self.session.handle(SessionEvent::Tick)
            },
            Operation::Leave => self.intent(Intent::Leave),
        };

        self.track(&actions);
        actions
    }

    /// Extract observable state for comparison with the model.
    pub fn observable_state(&self) -> ObservableState {
        let view = self.session.view();
        ObservableState {
            tiles: view
                .tiles
                .iter()
                .map(|tile| (tile.id.as_str().to_string(), tile.stream.is_some(), tile.is_active))
                .collect(),
            chat_len: self.session.chat().len(),
            unread: view.unread,
            chat_visible: view.chat_visible,
            ended: view.phase == huddle_app::SessionPhase::Ended,
            audio_enabled: view.toolbar.audio_enabled,
            video_enabled: view.toolbar.video_enabled,
        }
    }

    /// Snapshot of the session including ledger data.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_session(&self.session).with_ledger(&self.ledger)
    }

    /// Wrapped session.
    pub fn session(&self) -> &Session<SimEnv, SimStream, SimConnection> {
        &self.session
    }

    /// Ledger of every handle created so far.
    pub fn ledger(&self) -> &MediaLedger {
        &self.ledger
    }

    /// Simulated clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    fn intent(&mut self, intent: Intent) -> Vec<SessionAction> {
        self.session.handle(SessionEvent::Intent(intent))
    }

    /// Send through the intent, then answer as the transport would.
    fn send_message(&mut self, fail: bool) -> Vec<SessionAction> {
        let mut actions = self.intent(Intent::SendMessage(SENT_BODY.into()));
        let Some(body) = actions.iter().find_map(|action| match action {
            SessionAction::SendMessage { body } => Some(body.clone()),
            _ => None,
        }) else {
            return actions;
        };

        let confirmation = if fail {
            SessionEvent::SendFailed { reason: "data channel closed".into() }
        } else {
            SessionEvent::MessageSent { body }
        };
        actions.extend(self.session.handle(confirmation));
        actions
    }

    /// Remember capture tickets so completions can be delivered later.
    fn track(&mut self, actions: &[SessionAction]) {
        for action in actions {
            match action {
                SessionAction::AcquireLocalMedia { ticket } => self.pending_local.push_back(*ticket),
                SessionAction::CaptureDesktop { ticket } => self.pending_desktop.push_back(*ticket),
                _ => {},
            }
        }
    }

    fn fresh_stream(&mut self, prefix: &str, with_audio: bool) -> SimStream {
        self.next_stream += 1;
        let id = format!("{prefix}-s{}", self.next_stream);
        let stream =
            if with_audio { self.ledger.stream(id) } else { self.ledger.video_only_stream(id) };
        tracing::trace!(stream = %stream.id(), "simulated stream created");
        stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InvariantRegistry, ModelSession};

    #[test]
    fn fresh_world_matches_model() {
        let world = SimWorld::new();
        assert_eq!(world.observable_state(), ModelSession::new().observable_state());
    }

    #[test]
    fn join_stream_and_leave_release_everything() {
        let mut world = SimWorld::new();
        let registry = InvariantRegistry::standard();

        for op in [
            Operation::ResolveLocalMedia { granted: true },
            Operation::PeerJoin { peer: 1 },
            Operation::RemoteStreamAttach { peer: 1 },
            Operation::RemoteStreamAttach { peer: 2 },
        ] {
            world.apply(&op);
            registry.assert_all(&world.snapshot(), &format!("after {op:?}"));
        }
        assert_eq!(world.ledger().live_streams().len(), 3);

        let actions = world.apply(&Operation::Leave);

        assert_eq!(actions, vec![SessionAction::LeaveCall, SessionAction::Render]);
        assert!(world.ledger().live_streams().is_empty());
        assert!(world.ledger().live_connections().is_empty());
        assert_eq!(world.ledger().double_releases(), 0);
        registry.assert_all(&world.snapshot(), "after leave");
    }

    #[test]
    fn failed_send_leaves_log_untouched() {
        let mut world = SimWorld::new();

        world.apply(&Operation::SendMessage { fail: true });
        assert!(world.session().chat().is_empty());
        assert_eq!(world.session().notifications().len(), 1);

        world.apply(&Operation::SendMessage { fail: false });
        assert_eq!(world.session().chat().len(), 1);
    }

    #[test]
    fn dismiss_picks_active_notification() {
        let mut world = SimWorld::new();
        world.apply(&Operation::PeerError { peer: 0 });
        world.apply(&Operation::PeerError { peer: 1 });

        world.apply(&Operation::Dismiss { index: 3 });

        assert_eq!(world.session().notifications().len(), 1);
        assert!(world.apply(&Operation::Dismiss { index: 0 }).contains(&SessionAction::Render));
        assert!(world.apply(&Operation::Dismiss { index: 0 }).is_empty());
    }
}
