//! Per-source event channels.
//!
//! Each collaborator feeds the session through its own bounded channel, so
//! events from one source keep their order while sources interleave freely.
//! [`SessionInbox::recv`] merges the channels for the single reducer.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::SessionEvent;

/// Origin of a session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// Local user intents and clock ticks.
    Local,
    /// Peer signaling and remote media.
    Signaling,
    /// Local capture completions.
    Media,
    /// Chat transport.
    Chat,
}

impl EventSource {
    /// Source a given event belongs to.
    pub fn of<S, C>(event: &SessionEvent<S, C>) -> Self {
        match event {
            SessionEvent::Intent(_) | SessionEvent::Tick => Self::Local,
            SessionEvent::PeerJoined { .. }
            | SessionEvent::PeerConnected { .. }
            | SessionEvent::PeerClosed { .. }
            | SessionEvent::PeerError { .. }
            | SessionEvent::RemoteStreamAttached { .. }
            | SessionEvent::RemoteStreamDetached { .. } => Self::Signaling,
            SessionEvent::LocalMediaAcquired { .. }
            | SessionEvent::LocalMediaFailed { .. }
            | SessionEvent::DesktopCaptured { .. }
            | SessionEvent::DesktopCaptureFailed { .. } => Self::Media,
            SessionEvent::MessageReceived { .. }
            | SessionEvent::FileReceived { .. }
            | SessionEvent::MessageSent { .. }
            | SessionEvent::FileSent { .. }
            | SessionEvent::SendFailed { .. } => Self::Chat,
        }
    }
}

/// Create the per-source channels, each holding `capacity` events.
pub fn channel<S, C>(capacity: usize) -> (SessionSender<S, C>, SessionInbox<S, C>) {
    let capacity = capacity.max(1);
    let (local_tx, local) = mpsc::channel(capacity);
    let (signaling_tx, signaling) = mpsc::channel(capacity);
    let (media_tx, media) = mpsc::channel(capacity);
    let (chat_tx, chat) = mpsc::channel(capacity);

    let sender = SessionSender {
        local: local_tx,
        signaling: signaling_tx,
        media: media_tx,
        chat: chat_tx,
    };
    let inbox = SessionInbox {
        local,
        signaling,
        media,
        chat,
        local_open: true,
        signaling_open: true,
        media_open: true,
        chat_open: true,
    };
    (sender, inbox)
}

/// Sending half. Routes each event to the channel of its source.
#[derive(Debug)]
pub struct SessionSender<S, C> {
    local: mpsc::Sender<SessionEvent<S, C>>,
    signaling: mpsc::Sender<SessionEvent<S, C>>,
    media: mpsc::Sender<SessionEvent<S, C>>,
    chat: mpsc::Sender<SessionEvent<S, C>>,
}

impl<S, C> Clone for SessionSender<S, C> {
    fn clone(&self) -> Self {
        Self {
            local: self.local.clone(),
            signaling: self.signaling.clone(),
            media: self.media.clone(),
            chat: self.chat.clone(),
        }
    }
}

impl<S, C> SessionSender<S, C> {
    /// Send an event, waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns the event if the inbox was dropped.
    pub async fn send(&self, event: SessionEvent<S, C>) -> Result<(), SessionEvent<S, C>> {
        self.route(&event).send(event).await.map_err(|err| err.0)
    }

    /// Send an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns the event if its channel is full or the inbox was dropped.
    pub fn try_send(&self, event: SessionEvent<S, C>) -> Result<(), SessionEvent<S, C>> {
        self.route(&event).try_send(event).map_err(|err| match err {
            TrySendError::Full(event) | TrySendError::Closed(event) => event,
        })
    }

    fn route(&self, event: &SessionEvent<S, C>) -> &mpsc::Sender<SessionEvent<S, C>> {
        match EventSource::of(event) {
            EventSource::Local => &self.local,
            EventSource::Signaling => &self.signaling,
            EventSource::Media => &self.media,
            EventSource::Chat => &self.chat,
        }
    }
}

/// Receiving half, owned by the runtime.
#[derive(Debug)]
pub struct SessionInbox<S, C> {
    local: mpsc::Receiver<SessionEvent<S, C>>,
    signaling: mpsc::Receiver<SessionEvent<S, C>>,
    media: mpsc::Receiver<SessionEvent<S, C>>,
    chat: mpsc::Receiver<SessionEvent<S, C>>,
    local_open: bool,
    signaling_open: bool,
    media_open: bool,
    chat_open: bool,
}

impl<S, C> SessionInbox<S, C> {
    /// Next event from any source.
    ///
    /// Returns `None` once every sender is dropped and every channel drained.
    pub async fn recv(&mut self) -> Option<SessionEvent<S, C>> {
        loop {
            tokio::select! {
                event = self.local.recv(), if self.local_open => match event {
                    Some(event) => return Some(event),
                    None => self.local_open = false,
                },
                event = self.signaling.recv(), if self.signaling_open => match event {
                    Some(event) => return Some(event),
                    None => self.signaling_open = false,
                },
                event = self.media.recv(), if self.media_open => match event {
                    Some(event) => return Some(event),
                    None => self.media_open = false,
                },
                event = self.chat.recv(), if self.chat_open => match event {
                    Some(event) => return Some(event),
                    None => self.chat_open = false,
                },
                else => return None,
            }
        }
    }

    /// True while any source can still deliver events.
    pub fn is_open(&self) -> bool {
        self.local_open || self.signaling_open || self.media_open || self.chat_open
    }
}

#[cfg(test)]
mod tests {
    use huddle_core::ParticipantId;

    use super::*;
    use crate::Intent;

    type Event = SessionEvent<(), ()>;

    #[test]
    fn events_route_by_source() {
        let closed: Event = SessionEvent::PeerClosed { id: ParticipantId::from("p1") };
        let sent: Event = SessionEvent::MessageSent { body: "hi".into() };
        let intent: Event = Intent::HangUp.into();

        assert_eq!(EventSource::of(&closed), EventSource::Signaling);
        assert_eq!(EventSource::of(&sent), EventSource::Chat);
        assert_eq!(EventSource::of(&intent), EventSource::Local);
        assert_eq!(EventSource::of(&Event::Tick), EventSource::Local);
    }

    #[tokio::test]
    async fn per_source_order_preserved() {
        let (sender, mut inbox) = channel::<(), ()>(8);
        for n in 0..3 {
            let message = SessionEvent::MessageReceived { sender: "p1".into(), body: n.to_string() };
            assert!(sender.try_send(message).is_ok());
            assert!(sender.try_send(SessionEvent::PeerConnected { id: format!("p{n}").into() }).is_ok());
        }
        drop(sender);

        let mut bodies = Vec::new();
        let mut peers = Vec::new();
        while let Some(event) = inbox.recv().await {
            match event {
                SessionEvent::MessageReceived { body, .. } => bodies.push(body),
                SessionEvent::PeerConnected { id } => peers.push(id.to_string()),
                other => panic!("unexpected event {other:?}"),
            }
        }

        assert_eq!(bodies, ["0", "1", "2"]);
        assert_eq!(peers, ["p0", "p1", "p2"]);
        assert!(!inbox.is_open());
    }

    #[tokio::test]
    async fn full_channel_returns_event() {
        let (sender, _inbox) = channel::<(), ()>(1);
        assert!(sender.try_send(Intent::Play.into()).is_ok());

        let rejected = sender.try_send(Intent::HangUp.into());
        assert!(matches!(rejected, Err(SessionEvent::Intent(Intent::HangUp))));
    }
}
