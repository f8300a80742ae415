//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the browser driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`huddle_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Everything the runtime asks of the driver is recorded in shared state
//! reachable through a [`SimDriverHandle`], which also scripts capture
//! outcomes and chat transport failures.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use huddle_app::{CaptureTicket, Driver, SessionEvent, SessionSender, ViewModel};
use huddle_core::{Attachment, CaptureError, MediaStream};

use crate::sim_media::{MediaLedger, SimConnection, SimStream};

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Scripted result of the next capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// User granted access; a fresh stream is delivered.
    Grant,
    /// Capture failed.
    Fail(CaptureError),
}

/// Shared state between the driver and its handle.
#[derive(Debug, Default)]
struct SharedState {
    renders: Vec<ViewModel>,
    sent_messages: Vec<String>,
    sent_files: Vec<Attachment>,
    local_media_requests: Vec<CaptureTicket>,
    desktop_requests: Vec<CaptureTicket>,
    local_media_script: VecDeque<CaptureOutcome>,
    desktop_script: VecDeque<CaptureOutcome>,
    send_failure: Option<String>,
    playback_resumes: usize,
    leave_calls: usize,
    stopped: bool,
    next_stream: u64,
}

/// Simulation driver for deterministic testing.
///
/// Capture requests with a scripted outcome complete immediately through the
/// attached [`SessionSender`]. Unscripted requests stay pending; the test
/// completes them with the recorded ticket.
#[derive(Debug)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    ledger: MediaLedger,
    events: Option<SessionSender<SimStream, SimConnection>>,
}

impl SimDriver {
    /// Create a driver whose streams are recorded in `ledger`.
    pub fn new(ledger: MediaLedger) -> Self {
        Self { state: Arc::default(), ledger, events: None }
    }

    /// Deliver scripted capture completions through `sender`.
    ///
    /// The runtime's inbox stays open while the driver holds the sender.
    #[must_use]
    pub fn with_events(mut self, sender: SessionSender<SimStream, SimConnection>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Handle for inspecting and scripting the driver after it moves into a
    /// runtime.
    pub fn handle(&self) -> SimDriverHandle {
        SimDriverHandle { state: Arc::clone(&self.state) }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        lock(&self.state)
    }

    /// Resolve a capture request from its script.
    fn complete_capture(
        &self,
        ticket: CaptureTicket,
        outcome: Option<CaptureOutcome>,
        prefix: &str,
        desktop: bool,
    ) -> Result<(), SimDriverError> {
        let Some(outcome) = outcome else {
            return Ok(());
        };
        let Some(events) = self.events.as_ref() else {
            return Err(SimDriverError("no event channel for capture completion".into()));
        };

        let event = match outcome {
            CaptureOutcome::Grant => {
                let serial = {
                    let mut state = self.lock();
                    state.next_stream += 1;
                    state.next_stream
                };
                let id = format!("{prefix}-{serial}");
                if desktop {
                    let stream = self.ledger.video_only_stream(id);
                    SessionEvent::DesktopCaptured { ticket, stream }
                } else {
                    let stream = self.ledger.stream(id);
                    SessionEvent::LocalMediaAcquired { ticket, stream }
                }
            },
            CaptureOutcome::Fail(error) if desktop => {
                SessionEvent::DesktopCaptureFailed { ticket, error }
            },
            CaptureOutcome::Fail(error) => SessionEvent::LocalMediaFailed { ticket, error },
        };

        match events.try_send(event) {
            Ok(()) => Ok(()),
            Err(
                SessionEvent::DesktopCaptured { mut stream, .. }
                | SessionEvent::LocalMediaAcquired { mut stream, .. },
            ) => {
                if let Err(e) = stream.stop() {
                    tracing::debug!(error = %e, "undelivered stream already stopped");
                }
                Err(SimDriverError("media channel unavailable".into()))
            },
            Err(_) => Err(SimDriverError("media channel unavailable".into())),
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Stream = SimStream;
    type Connection = SimConnection;

    fn render(&mut self, view: &ViewModel) -> Result<(), Self::Error> {
        tracing::trace!(tiles = view.tiles.len(), "render");
        self.lock().renders.push(view.clone());
        Ok(())
    }

    fn acquire_local_media(&mut self, ticket: CaptureTicket) -> Result<(), Self::Error> {
        let outcome = {
            let mut state = self.lock();
            state.local_media_requests.push(ticket);
            state.local_media_script.pop_front()
        };
        self.complete_capture(ticket, outcome, "camera", false)
    }

    fn capture_desktop(&mut self, ticket: CaptureTicket) -> Result<(), Self::Error> {
        let outcome = {
            let mut state = self.lock();
            state.desktop_requests.push(ticket);
            state.desktop_script.pop_front()
        };
        self.complete_capture(ticket, outcome, "desktop", true)
    }

    async fn send_chat(&mut self, body: &str) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if let Some(reason) = state.send_failure.clone() {
            return Err(SimDriverError(reason));
        }
        state.sent_messages.push(body.to_string());
        Ok(())
    }

    async fn send_file(&mut self, attachment: &Attachment) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if let Some(reason) = state.send_failure.clone() {
            return Err(SimDriverError(reason));
        }
        state.sent_files.push(attachment.clone());
        Ok(())
    }

    fn resume_playback(&mut self) -> Result<(), Self::Error> {
        self.lock().playback_resumes += 1;
        Ok(())
    }

    async fn leave_call(&mut self) -> Result<(), Self::Error> {
        self.lock().leave_calls += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
        self.events = None;
    }
}

/// Inspection and scripting handle for a [`SimDriver`].
#[derive(Debug, Clone)]
pub struct SimDriverHandle {
    state: Arc<Mutex<SharedState>>,
}

impl SimDriverHandle {
    /// Queue the outcome of the next local media request.
    pub fn script_local_media(&self, outcome: CaptureOutcome) {
        lock(&self.state).local_media_script.push_back(outcome);
    }

    /// Queue the outcome of the next desktop capture request.
    pub fn script_desktop(&self, outcome: CaptureOutcome) {
        lock(&self.state).desktop_script.push_back(outcome);
    }

    /// Make chat sends fail with `reason`, or succeed again with `None`.
    pub fn fail_sends(&self, reason: Option<&str>) {
        lock(&self.state).send_failure = reason.map(str::to_string);
    }

    /// Every rendered view model, in order.
    pub fn renders(&self) -> Vec<ViewModel> {
        lock(&self.state).renders.clone()
    }

    /// Most recent view model.
    pub fn last_render(&self) -> Option<ViewModel> {
        lock(&self.state).renders.last().cloned()
    }

    /// Messages the transport accepted.
    pub fn sent_messages(&self) -> Vec<String> {
        lock(&self.state).sent_messages.clone()
    }

    /// File offers the transport accepted.
    pub fn sent_files(&self) -> Vec<Attachment> {
        lock(&self.state).sent_files.clone()
    }

    /// Tickets of local media requests, in order.
    pub fn local_media_requests(&self) -> Vec<CaptureTicket> {
        lock(&self.state).local_media_requests.clone()
    }

    /// Tickets of desktop capture requests, in order.
    pub fn desktop_requests(&self) -> Vec<CaptureTicket> {
        lock(&self.state).desktop_requests.clone()
    }

    /// Number of playback resume requests.
    pub fn playback_resumes(&self) -> usize {
        lock(&self.state).playback_resumes
    }

    /// Number of leave signals.
    pub fn leave_calls(&self) -> usize {
        lock(&self.state).leave_calls
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        lock(&self.state).stopped
    }
}

fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
