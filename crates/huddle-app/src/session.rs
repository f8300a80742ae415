//! Session coordinator state machine.
//!
//! [`Session`] owns the stream registry, peer roster, chat log and
//! notification center of one call. It consumes [`SessionEvent`]s from
//! collaborators and [`Intent`]s from the local user, and returns
//! [`SessionAction`]s for the runtime to execute. It performs no I/O.
//!
//! # Failure handling
//!
//! Event handlers return `Result<(), SessionError>`. An error stops at
//! [`Session::handle`]: it is logged, surfaced as an error notification, and
//! the session continues.
//!
//! # Staleness
//!
//! Every capture request carries a [`CaptureTicket`]. Hang-up and leave
//! advance the capture generation, so completions for requests issued before
//! either are released instead of attached.

use huddle_core::{
    Attachment, CaptureError, ChatLog, Environment, MediaStream, NotificationCenter,
    NotificationId, NotificationLevel, ParticipantId, PeerConnection, PeerRoster, PeerState,
    RegistryError, RosterChange, StreamKind, StreamRegistry, TrackKind,
};
use serde::Serialize;

use crate::{
    CaptureTicket, Intent, SessionAction, SessionConfig, SessionError, SessionEvent,
    view::{NotificationView, Tile, TileStream, Toolbar, ViewModel},
};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// Created, not yet initialized.
    Idle,
    /// Initialized and in the call.
    Live,
    /// Local user left. Terminal.
    Ended,
}

/// Session coordinator.
///
/// # Type Parameters
///
/// - `E`: Environment providing time
/// - `S`: Media stream handle
/// - `C`: Peer connection handle
#[derive(Debug)]
pub struct Session<E, S, C>
where
    E: Environment,
{
    env: E,
    config: SessionConfig,
    streams: StreamRegistry<S>,
    roster: PeerRoster<C>,
    chat: ChatLog,
    notifications: NotificationCenter<E::Instant>,
    /// Focused tile. `None` if nothing is focused.
    active: Option<ParticipantId>,
    phase: SessionPhase,
    /// Capture generation; advanced by hang-up and leave.
    generation: u64,
    next_ticket: u64,
    audio_enabled: bool,
    video_enabled: bool,
}

impl<E, S, C> Session<E, S, C>
where
    E: Environment,
    S: MediaStream,
    C: PeerConnection,
{
    /// Create an idle session.
    pub fn new(env: E, config: SessionConfig) -> Self {
        let notifications = NotificationCenter::new(config.max_notifications);
        Self {
            env,
            config,
            streams: StreamRegistry::new(),
            roster: PeerRoster::new(),
            chat: ChatLog::new(),
            notifications,
            active: None,
            phase: SessionPhase::Idle,
            generation: 0,
            next_ticket: 0,
            audio_enabled: true,
            video_enabled: true,
        }
    }

    /// Start the session and request local media.
    ///
    /// Only the first call has an effect.
    pub fn initialize(&mut self) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Idle {
            tracing::debug!(phase = ?self.phase, "initialize ignored");
            return vec![];
        }

        self.phase = SessionPhase::Live;
        tracing::info!("session initialized");

        let ticket = self.issue_ticket();
        vec![SessionAction::AcquireLocalMedia { ticket }, SessionAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent<S, C>) -> Vec<SessionAction> {
        let event = match event {
            SessionEvent::Intent(intent) => return self.apply_intent(intent),
            SessionEvent::Tick => return self.tick(),
            event => event,
        };

        match self.phase {
            SessionPhase::Live => {
                let result = self.apply(event);
                self.conclude(result)
            },
            SessionPhase::Idle => {
                self.release_carried(event);
                self.conclude(Err(SessionError::NotInitialized))
            },
            SessionPhase::Ended => {
                tracing::debug!("event after leave ignored");
                self.release_carried(event);
                vec![]
            },
        }
    }

    /// Dispatch a local user intent.
    pub fn apply_intent(&mut self, intent: Intent) -> Vec<SessionAction> {
        if self.phase == SessionPhase::Ended {
            tracing::debug!(?intent, "intent after leave ignored");
            return vec![];
        }

        match intent {
            Intent::ToggleChatPanel => self.toggle_chat_panel(),
            Intent::SetActiveParticipant(id) => self.set_active_participant(id),
            Intent::RequestDesktopShare => self.request_desktop_share(),
            Intent::StopDesktopShare => self.stop_desktop_share(),
            Intent::HangUp => self.hang_up(),
            Intent::Leave => self.leave(),
            Intent::DismissNotification(id) => self.dismiss_notification(id),
            Intent::SendMessage(body) => self.send_message(body),
            Intent::SendFile(attachment) => self.send_file(attachment),
            Intent::ToggleAudio => self.toggle_audio(),
            Intent::ToggleVideo => self.toggle_video(),
            Intent::Play => self.play(),
        }
    }

    /// Show or hide the chat panel. Showing it marks all messages read.
    pub fn toggle_chat_panel(&mut self) -> Vec<SessionAction> {
        let visible = !self.chat.is_panel_visible();
        self.chat.set_panel_visible(visible);
        vec![SessionAction::Render]
    }

    /// Focus a tile, or clear focus if `id` is already focused.
    ///
    /// Identifiers without a tile are ignored.
    pub fn set_active_participant(&mut self, id: ParticipantId) -> Vec<SessionAction> {
        if !self.has_tile(&id) {
            tracing::debug!(participant = %id, "no tile to focus");
            return vec![];
        }

        if self.active.as_ref() == Some(&id) {
            self.active = None;
        } else {
            self.active = Some(id);
        }
        vec![SessionAction::Render]
    }

    /// Ask the capture collaborator for a desktop stream.
    pub fn request_desktop_share(&mut self) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Live {
            return vec![];
        }
        let ticket = self.issue_ticket();
        vec![SessionAction::CaptureDesktop { ticket }]
    }

    /// Stop sharing the desktop.
    pub fn stop_desktop_share(&mut self) -> Vec<SessionAction> {
        let released = self.streams.detach(&ParticipantId::local_desktop(), Some(StreamKind::Desktop));
        self.settle();
        if released == 0 { vec![] } else { vec![SessionAction::Render] }
    }

    /// Release the local camera and desktop streams.
    ///
    /// Pending capture requests become stale. Remote peers are untouched.
    pub fn hang_up(&mut self) -> Vec<SessionAction> {
        self.generation += 1;
        self.streams.detach(&ParticipantId::local_camera(), Some(StreamKind::Camera));
        self.streams.detach(&ParticipantId::local_desktop(), Some(StreamKind::Desktop));
        tracing::info!(generation = self.generation, "hung up");
        self.settle();
        vec![SessionAction::Render]
    }

    /// Leave the call: close every peer, release every stream, end the
    /// session.
    pub fn leave(&mut self) -> Vec<SessionAction> {
        if self.phase == SessionPhase::Ended {
            return vec![];
        }

        let closed = self.roster.close_all(&mut self.streams);
        let released = self.streams.detach_all();
        self.generation += 1;
        self.phase = SessionPhase::Ended;
        self.active = None;

        // Per-peer notifications are noise once we are gone
        self.roster.take_changes();
        self.streams.take_changes();

        tracing::info!(closed, released, "left call");
        self.notify(NotificationLevel::Info, "You left the call");
        vec![SessionAction::LeaveCall, SessionAction::Render]
    }

    /// Remove a notification. No-op if it is not active.
    pub fn dismiss_notification(&mut self, id: NotificationId) -> Vec<SessionAction> {
        match self.notifications.dismiss(id) {
            Some(_) => vec![SessionAction::Render],
            None => vec![],
        }
    }

    /// Send a text message. Blank messages are ignored.
    ///
    /// The message is logged once the transport confirms it
    /// ([`SessionEvent::MessageSent`]).
    pub fn send_message(&mut self, body: String) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Live || body.trim().is_empty() {
            return vec![];
        }
        vec![SessionAction::SendMessage { body }]
    }

    /// Offer a file. Logged once the transport confirms it.
    pub fn send_file(&mut self, attachment: Attachment) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Live {
            return vec![];
        }
        vec![SessionAction::SendFile { attachment }]
    }

    /// Mute or unmute the microphone.
    pub fn toggle_audio(&mut self) -> Vec<SessionAction> {
        self.audio_enabled = !self.audio_enabled;
        let result = self.set_local_track(TrackKind::Audio, self.audio_enabled);
        self.conclude(result)
    }

    /// Turn the camera picture on or off.
    pub fn toggle_video(&mut self) -> Vec<SessionAction> {
        self.video_enabled = !self.video_enabled;
        let result = self.set_local_track(TrackKind::Video, self.video_enabled);
        self.conclude(result)
    }

    /// Resume playback blocked by autoplay policy.
    pub fn play(&self) -> Vec<SessionAction> {
        vec![SessionAction::ResumePlayback]
    }

    /// Expire old notifications.
    pub fn tick(&mut self) -> Vec<SessionAction> {
        let Some(ttl) = self.config.notification_ttl() else {
            return vec![];
        };
        let expired = self.notifications.expire(self.env.now(), ttl);
        if expired == 0 { vec![] } else { vec![SessionAction::Render] }
    }

    /// Derive the view model from current state.
    pub fn view(&self) -> ViewModel {
        let tiles = [ParticipantId::local_camera(), ParticipantId::local_desktop()]
            .into_iter()
            .chain(self.roster.list().cloned())
            .map(|id| self.tile(id))
            .collect();

        let notifications = self
            .notifications
            .active()
            .map(|n| NotificationView { id: n.id, level: n.level, message: n.message.clone() })
            .collect();

        let toolbar = Toolbar {
            camera_on: self.streams.get(&ParticipantId::local_camera(), StreamKind::Camera).is_some(),
            desktop_sharing: self
                .streams
                .get(&ParticipantId::local_desktop(), StreamKind::Desktop)
                .is_some(),
            audio_enabled: self.audio_enabled,
            video_enabled: self.video_enabled,
        };

        ViewModel {
            tiles,
            chat_visible: self.chat.is_panel_visible(),
            unread: self.chat.unread(),
            notifications,
            toolbar,
            phase: self.phase,
        }
    }

    /// Stream registry.
    pub fn streams(&self) -> &StreamRegistry<S> {
        &self.streams
    }

    /// Peer roster.
    pub fn roster(&self) -> &PeerRoster<C> {
        &self.roster
    }

    /// Chat log.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Notification center.
    pub fn notifications(&self) -> &NotificationCenter<E::Instant> {
        &self.notifications
    }

    /// Focused participant. `None` if nothing is focused.
    pub fn active_participant(&self) -> Option<&ParticipantId> {
        self.active.as_ref()
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current capture generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Microphone enabled.
    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    /// Camera picture enabled.
    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn apply(&mut self, event: SessionEvent<S, C>) -> Result<(), SessionError> {
        match event {
            SessionEvent::PeerJoined { id, connection } => self.roster.upsert(id, connection)?,
            SessionEvent::PeerConnected { id } => self.roster.mark_connected(&id)?,
            SessionEvent::PeerClosed { id } => {
                if self.roster.mark_closed(&id, &mut self.streams)?.is_none() {
                    tracing::debug!(peer = %id, "close for unknown peer");
                }
            },
            SessionEvent::PeerError { id, message } => {
                tracing::warn!(peer = %id, %message, "peer connection error");
                self.notify(
                    NotificationLevel::Warning,
                    format!("Connection problem with {id}: {message}"),
                );
            },
            SessionEvent::RemoteStreamAttached { id, stream } => {
                if !id.is_reserved() && !self.roster.contains(&id) {
                    tracing::debug!(peer = %id, "stream arrived before peer, holding");
                }
                self.streams.attach(id, StreamKind::Remote, stream)?;
            },
            SessionEvent::RemoteStreamDetached { id } => {
                if id.is_reserved() {
                    return Err(RegistryError::KindMismatch { id, kind: StreamKind::Remote }.into());
                }
                self.streams.detach(&id, Some(StreamKind::Remote));
            },
            SessionEvent::MessageReceived { sender, body } => {
                self.chat.append(sender, body, self.env.unix_millis());
            },
            SessionEvent::FileReceived { sender, attachment } => {
                self.chat.append_file(sender, attachment, self.env.unix_millis());
            },
            SessionEvent::MessageSent { body } => {
                let sender = self.config.local_sender.clone();
                self.chat.append(sender, body, self.env.unix_millis());
            },
            SessionEvent::FileSent { attachment } => {
                let sender = self.config.local_sender.clone();
                self.chat.append_file(sender, attachment, self.env.unix_millis());
            },
            SessionEvent::SendFailed { reason } => {
                tracing::warn!(%reason, "chat send failed");
                self.notify(NotificationLevel::Warning, format!("Message not sent: {reason}"));
            },
            SessionEvent::LocalMediaAcquired { ticket, stream } => {
                let camera = ParticipantId::local_camera();
                if self.is_stale(ticket) {
                    self.streams.discard(&camera, stream);
                    return Ok(());
                }
                self.streams.attach(camera, StreamKind::Camera, stream)?;
                if !self.audio_enabled {
                    self.set_local_track(TrackKind::Audio, false)?;
                }
                if !self.video_enabled {
                    self.set_local_track(TrackKind::Video, false)?;
                }
            },
            SessionEvent::LocalMediaFailed { ticket, error } => {
                if !self.is_stale(ticket) {
                    self.capture_failed("Camera and microphone", &error);
                }
            },
            SessionEvent::DesktopCaptured { ticket, stream } => {
                let desktop = ParticipantId::local_desktop();
                if self.is_stale(ticket) {
                    self.streams.discard(&desktop, stream);
                    return Ok(());
                }
                self.streams.attach(desktop, StreamKind::Desktop, stream)?;
            },
            SessionEvent::DesktopCaptureFailed { ticket, error } => {
                if !self.is_stale(ticket) {
                    self.capture_failed("Screen sharing", &error);
                }
            },
            // Routed by `handle`
            SessionEvent::Intent(_) | SessionEvent::Tick => {},
        }
        Ok(())
    }

    /// Release handles carried by an event the session will not apply.
    fn release_carried(&mut self, event: SessionEvent<S, C>) {
        match event {
            SessionEvent::PeerJoined { id, connection } => self.roster.discard(&id, connection),
            SessionEvent::RemoteStreamAttached { id, stream } => self.streams.discard(&id, stream),
            SessionEvent::LocalMediaAcquired { stream, .. } => {
                self.streams.discard(&ParticipantId::local_camera(), stream);
            },
            SessionEvent::DesktopCaptured { stream, .. } => {
                self.streams.discard(&ParticipantId::local_desktop(), stream);
            },
            _ => {},
        }
    }

    /// Coordinator boundary: surface a handler error, settle, re-render.
    fn conclude(&mut self, result: Result<(), SessionError>) -> Vec<SessionAction> {
        if let Err(err) = result {
            tracing::warn!(error = %err, "session handler failed");
            self.notify(NotificationLevel::Error, err.to_string());
        }
        self.settle();
        vec![SessionAction::Render]
    }

    /// Consume registry and roster changes.
    fn settle(&mut self) {
        for change in self.streams.take_changes() {
            tracing::trace!(?change, "stream change");
        }

        for change in self.roster.take_changes() {
            match change {
                RosterChange::Joined { id } => {
                    self.notify(NotificationLevel::Info, format!("{id} is joining"));
                },
                RosterChange::Rejoined { id } => {
                    tracing::debug!(peer = %id, "peer reconnecting");
                },
                RosterChange::Connected { id } => {
                    self.notify(NotificationLevel::Info, format!("{id} joined the call"));
                },
                RosterChange::Closed { id, from } => {
                    if from == PeerState::Connecting {
                        self.notify(NotificationLevel::Warning, format!("Could not connect to {id}"));
                    } else {
                        self.notify(NotificationLevel::Info, format!("{id} left the call"));
                    }
                    if self.active.as_ref() == Some(&id) {
                        self.active = None;
                    }
                },
            }
        }
    }

    fn set_local_track(&mut self, track: TrackKind, enabled: bool) -> Result<(), SessionError> {
        let camera = ParticipantId::local_camera();
        if self.streams.get(&camera, StreamKind::Camera).is_none() {
            return Ok(());
        }
        self.streams.set_track_enabled(&camera, StreamKind::Camera, track, enabled)?;
        Ok(())
    }

    fn capture_failed(&mut self, what: &str, error: &CaptureError) {
        let level = if error.is_user_decision() {
            NotificationLevel::Info
        } else {
            NotificationLevel::Warning
        };
        tracing::debug!(%error, what, "capture failed");
        self.notify(level, format!("{what}: {error}"));
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(level, message, self.env.now());
    }

    fn issue_ticket(&mut self) -> CaptureTicket {
        let ticket = CaptureTicket::new(self.generation, self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    fn is_stale(&self, ticket: CaptureTicket) -> bool {
        let stale = ticket.generation() != self.generation;
        if stale {
            tracing::debug!(
                ticket = ticket.sequence(),
                issued = ticket.generation(),
                current = self.generation,
                "stale capture completion"
            );
        }
        stale
    }

    fn has_tile(&self, id: &ParticipantId) -> bool {
        id.is_reserved() || self.roster.contains(id)
    }

    fn tile(&self, id: ParticipantId) -> Tile {
        let stream = self
            .streams
            .get_for(&id)
            .map(|stream| TileStream { id: stream.id().clone(), kind: StreamKind::for_owner(&id) });
        let is_camera = id.is_local_camera();

        Tile {
            is_active: self.active.as_ref() == Some(&id),
            is_local: id.is_reserved(),
            is_muted: is_camera,
            is_mirrored: is_camera,
            stream,
            id,
        }
    }
}
