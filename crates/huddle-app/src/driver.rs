//! Driver trait for abstracting platform I/O.
//!
//! The [`Driver`] trait decouples the runtime from the platform. The browser
//! frontend binds it to the DOM, the capture APIs and the data channel;
//! simulation records every call. The generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use huddle_core::{Attachment, MediaStream, PeerConnection};

use crate::{CaptureTicket, ViewModel};

/// Platform I/O used by the runtime.
///
/// Capture requests return immediately. Their completions arrive later as
/// [`crate::SessionEvent::LocalMediaAcquired`] /
/// [`crate::SessionEvent::DesktopCaptured`] (or the matching failures)
/// through the media channel, carrying the same ticket.
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Stream`](Driver::Stream): Media stream handle
/// - [`Connection`](Driver::Connection): Peer connection handle
pub trait Driver {
    /// Platform-specific error type.
    type Error: std::error::Error + 'static;

    /// Media stream handle.
    type Stream: MediaStream;

    /// Peer connection handle.
    type Connection: PeerConnection;

    /// Draw the view model.
    ///
    /// # Errors
    ///
    /// Returns an error if presentation fails. The runtime logs it and keeps
    /// going.
    fn render(&mut self, view: &ViewModel) -> Result<(), Self::Error>;

    /// Start acquiring the local camera and microphone.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be issued at all.
    fn acquire_local_media(&mut self, ticket: CaptureTicket) -> Result<(), Self::Error>;

    /// Start the desktop capture prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be issued at all.
    fn capture_desktop(&mut self, ticket: CaptureTicket) -> Result<(), Self::Error>;

    /// Send a text message to every peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat transport rejects the message.
    fn send_chat(&mut self, body: &str) -> impl Future<Output = Result<(), Self::Error>>;

    /// Offer a file to every peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat transport rejects the offer.
    fn send_file(
        &mut self,
        attachment: &Attachment,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Resume media elements blocked by autoplay policy.
    ///
    /// # Errors
    ///
    /// Returns an error if playback cannot be resumed.
    fn resume_playback(&mut self) -> Result<(), Self::Error>;

    /// Tell signaling the local user left.
    ///
    /// # Errors
    ///
    /// Returns an error if signaling is unreachable.
    fn leave_call(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Release platform resources. Called once when the runtime ends.
    fn stop(&mut self);
}
