//! Side effects requested by the session coordinator.
//!
//! [`SessionAction`]s are instructions for the runtime to execute through the
//! [`crate::Driver`]. The coordinator never performs I/O itself.

use huddle_core::Attachment;

/// Identifies one capture request.
///
/// The generation advances on hang-up and leave. A completion carrying a
/// ticket from an older generation is stale and its stream is released
/// instead of attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket {
    generation: u64,
    sequence: u64,
}

impl CaptureTicket {
    pub(crate) fn new(generation: u64, sequence: u64) -> Self {
        Self { generation, sequence }
    }

    /// Capture generation the request was issued in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request number, unique per session.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Actions produced by the session coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Re-render the view model.
    Render,

    /// Acquire the local camera and microphone.
    AcquireLocalMedia {
        /// Ticket to return with the completion.
        ticket: CaptureTicket,
    },

    /// Prompt the user to pick a screen or window to share.
    CaptureDesktop {
        /// Ticket to return with the completion.
        ticket: CaptureTicket,
    },

    /// Send a text message over the chat transport.
    SendMessage {
        /// Message text.
        body: String,
    },

    /// Offer a file over the chat transport.
    SendFile {
        /// File metadata.
        attachment: Attachment,
    },

    /// Resume media playback blocked by autoplay policy.
    ResumePlayback,

    /// Tell signaling the local user left. Ends the runtime.
    LeaveCall,
}
