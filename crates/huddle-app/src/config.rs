//! Session configuration.
//!
//! Everything has a default; embedders typically deserialize a partial JSON
//! object handed over by the page and let serde fill in the rest.

use std::time::Duration;

use huddle_core::ParticipantId;
use serde::{Deserialize, Serialize};

use crate::{SessionInbox, SessionSender, inbox};

/// Default lifetime of a notification before it expires.
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 10_000;

/// Default number of notifications kept active at once.
pub const DEFAULT_MAX_NOTIFICATIONS: usize = 8;

/// Default interval between runtime ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// Default capacity of each per-source event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sender recorded on messages the local user sends.
    pub local_sender: ParticipantId,
    /// Notification lifetime in milliseconds. `None` keeps them until
    /// dismissed.
    pub notification_ttl_ms: Option<u64>,
    /// Maximum active notifications; the oldest is dropped first.
    pub max_notifications: usize,
    /// Runtime tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Capacity of each per-source event channel.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_sender: ParticipantId::local_camera(),
            notification_ttl_ms: Some(DEFAULT_NOTIFICATION_TTL_MS),
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Set the sender recorded on local messages.
    #[must_use]
    pub fn with_local_sender(mut self, sender: impl Into<ParticipantId>) -> Self {
        self.local_sender = sender.into();
        self
    }

    /// Set the notification lifetime. `None` disables expiry.
    #[must_use]
    pub fn with_notification_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.notification_ttl_ms = ttl.map(|ttl| ttl.as_millis() as u64);
        self
    }

    /// Set the maximum number of active notifications.
    #[must_use]
    pub fn with_max_notifications(mut self, max: usize) -> Self {
        self.max_notifications = max;
        self
    }

    /// Set the runtime tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the capacity of each per-source event channel.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Notification lifetime. `None` if notifications never expire.
    pub fn notification_ttl(&self) -> Option<Duration> {
        self.notification_ttl_ms.map(Duration::from_millis)
    }

    /// Runtime tick interval, at least one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Per-source channel capacity, at least one.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }

    /// Create the per-source channels sized by [`Self::channel_capacity`].
    pub fn channel<S, C>(&self) -> (SessionSender<S, C>, SessionInbox<S, C>) {
        inbox::channel(self.channel_capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Intent, SessionEvent};

    #[test]
    fn builders_round_trip_durations() {
        let config = SessionConfig::default()
            .with_notification_ttl(Some(Duration::from_secs(3)))
            .with_tick_interval(Duration::from_millis(250));

        assert_eq!(config.notification_ttl(), Some(Duration::from_secs(3)));
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
    }

    #[test]
    fn zero_values_are_clamped() {
        let mut config = SessionConfig::default().with_tick_interval(Duration::ZERO);
        config.channel_capacity = 0;

        assert_eq!(config.tick_interval(), Duration::from_millis(1));
        assert_eq!(config.channel_capacity(), 1);
    }

    #[test]
    fn channel_uses_configured_capacity() {
        let config = SessionConfig::default().with_channel_capacity(2);
        let (sender, _inbox) = config.channel::<(), ()>();

        assert!(sender.try_send(Intent::Play.into()).is_ok());
        assert!(sender.try_send(Intent::Play.into()).is_ok());
        assert!(sender.try_send(Intent::Play.into()).is_err());
        // Other sources have their own room
        assert!(sender.try_send(SessionEvent::PeerConnected { id: "p1".into() }).is_ok());
    }

    #[test]
    fn disabled_ttl() {
        let config = SessionConfig::default().with_notification_ttl(None);
        assert_eq!(config.notification_ttl(), None);
    }
}
