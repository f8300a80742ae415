//! Append-only chat log with an unread counter.
//!
//! Sequence numbers are assigned in arrival order and strictly increase. The
//! log never edits or deletes. Chat history is independent of peer liveness:
//! messages from a peer that has since left stay in the log.

use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;

/// File metadata attached to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as offered by the sender.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, empty if unknown.
    pub mime_type: String,
}

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Position in the log. Strictly increasing.
    pub sequence: u64,
    /// Sender of the message.
    pub sender: ParticipantId,
    /// Message text. For file messages, the file name.
    pub body: String,
    /// Arrival time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// File metadata for file messages.
    pub attachment: Option<Attachment>,
}

/// Ordered, append-only message log.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_sequence: u64,
    unread: usize,
    panel_visible: bool,
}

impl ChatLog {
    /// Create an empty log with the chat panel hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text message and return it.
    ///
    /// Increments the unread counter while the chat panel is hidden.
    pub fn append(
        &mut self,
        sender: ParticipantId,
        body: impl Into<String>,
        timestamp_ms: u64,
    ) -> &ChatMessage {
        self.push(sender, body.into(), timestamp_ms, None)
    }

    /// Append a file message and return it.
    pub fn append_file(
        &mut self,
        sender: ParticipantId,
        attachment: Attachment,
        timestamp_ms: u64,
    ) -> &ChatMessage {
        let body = attachment.name.clone();
        self.push(sender, body, timestamp_ms, Some(attachment))
    }

    /// Reset the unread counter.
    pub fn mark_all_read(&mut self) {
        self.unread = 0;
    }

    /// Record chat panel visibility. Becoming visible marks all read.
    pub fn set_panel_visible(&mut self, visible: bool) {
        self.panel_visible = visible;
        if visible {
            self.mark_all_read();
        }
    }

    /// Whether the chat panel is visible.
    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Messages appended while the panel was hidden and not yet read.
    pub fn unread(&self) -> usize {
        self.unread
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages sent by `sender`, in arrival order.
    pub fn messages_from<'a>(
        &'a self,
        sender: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a ChatMessage> + 'a {
        self.messages.iter().filter(move |m| &m.sender == sender)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(
        &mut self,
        sender: ParticipantId,
        body: String,
        timestamp_ms: u64,
        attachment: Option<Attachment>,
    ) -> &ChatMessage {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if !self.panel_visible {
            self.unread += 1;
        }

        tracing::trace!(sequence, sender = %sender, "chat message appended");
        let index = self.messages.len();
        self.messages.push(ChatMessage { sequence, sender, body, timestamp_ms, attachment });
        &self.messages[index]
    }
}
