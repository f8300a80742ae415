//! User-facing notifications.
//!
//! Any component may raise a notification (peer joined or left, capture
//! refused, send failed, handler error). Notifications stay active until the
//! user dismisses them, they expire, or newer ones push them out.

use std::{collections::VecDeque, ops::Sub, time::Duration};

use serde::{Deserialize, Serialize};

/// Notification identifier. Unique per session, increasing.
pub type NotificationId = u64;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Informational (peer joined, share cancelled).
    Info,
    /// Something failed but the session is unaffected.
    Warning,
    /// An operation or handler failed.
    Error,
}

/// A notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification<I> {
    /// Identifier used to dismiss.
    pub id: NotificationId,
    /// Severity.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
    /// Set once dismissed. Active notifications are never dismissed.
    pub dismissed: bool,
    /// When the notification was raised.
    pub created_at: I,
}

/// Active notifications, oldest first.
#[derive(Debug, Clone)]
pub struct NotificationCenter<I> {
    active: VecDeque<Notification<I>>,
    next_id: NotificationId,
    capacity: usize,
}

impl<I> NotificationCenter<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a center holding at most `capacity` notifications (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self { active: VecDeque::new(), next_id: 1, capacity: capacity.max(1) }
    }

    /// Raise a notification and return its id.
    ///
    /// Drops the oldest notification when full.
    pub fn push(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: I,
    ) -> NotificationId {
        let id = self.next_id;
        self.next_id += 1;

        while self.active.len() >= self.capacity {
            if let Some(dropped) = self.active.pop_front() {
                tracing::trace!(id = dropped.id, "notification dropped, center full");
            }
        }

        let message = message.into();
        tracing::debug!(id, ?level, %message, "notification raised");
        self.active.push_back(Notification { id, level, message, dismissed: false, created_at: now });
        id
    }

    /// Dismiss a notification. `None` if it is not active.
    pub fn dismiss(&mut self, id: NotificationId) -> Option<Notification<I>> {
        let position = self.active.iter().position(|n| n.id == id)?;
        let mut notification = self.active.remove(position)?;
        notification.dismissed = true;
        Some(notification)
    }

    /// Remove notifications raised more than `ttl` before `now`.
    ///
    /// Returns the number removed.
    pub fn expire(&mut self, now: I, ttl: Duration) -> usize {
        let before = self.active.len();
        self.active.retain(|n| now < n.created_at || now - n.created_at < ttl);
        before - self.active.len()
    }

    /// Active notifications, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &Notification<I>> {
        self.active.iter()
    }

    /// Active notification by id.
    pub fn get(&self, id: NotificationId) -> Option<&Notification<I>> {
        self.active.iter().find(|n| n.id == id)
    }

    /// Number of active notifications.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True if none are active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
