//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Session`]: coordinator state machine
//! - [`SessionInbox`]: one channel per event source
//! - [`Driver`]: platform-specific I/O

use std::collections::VecDeque;

use huddle_core::{CaptureError, Environment};
use tokio::time::MissedTickBehavior;

use crate::{Driver, Session, SessionAction, SessionConfig, SessionEvent, SessionInbox};

/// Session stream and connection types for a driver.
type DriverSession<E, D> = Session<E, <D as Driver>::Stream, <D as Driver>::Connection>;

/// Generic runtime that orchestrates Session, inbox and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: DriverSession<E, D>,
    inbox: SessionInbox<D::Stream, D::Connection>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a runtime over a fresh session.
    pub fn new(
        driver: D,
        env: E,
        config: SessionConfig,
        inbox: SessionInbox<D::Stream, D::Connection>,
    ) -> Self {
        let session = Session::new(env, config);
        Self { driver, session, inbox }
    }

    /// Run the event loop until the local user leaves or every event source
    /// is closed.
    ///
    /// This is the core orchestration loop that:
    /// 1. Initializes the session
    /// 2. Takes the next event from any source, or a tick
    /// 3. Feeds it to the session
    /// 4. Executes the resulting actions through the driver
    ///
    /// Driver failures never end the loop: they are logged or fed back to
    /// the session as failure events. Returns the final session state.
    pub async fn run(mut self) -> DriverSession<E, D> {
        let actions = self.session.initialize();
        let mut done = self.execute(actions).await;

        let mut ticker = tokio::time::interval(self.session.config().tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !done {
            let event = tokio::select! {
                event = self.inbox.recv() => match event {
                    Some(event) => event,
                    None => {
                        tracing::info!("all event sources closed");
                        break;
                    },
                },
                _ = ticker.tick() => SessionEvent::Tick,
            };

            let actions = self.session.handle(event);
            done = self.execute(actions).await;
        }

        self.driver.stop();
        self.session
    }

    /// Execute actions, feeding driver results back into the session.
    ///
    /// Returns `true` once the call was left.
    async fn execute(&mut self, initial_actions: Vec<SessionAction>) -> bool {
        let mut pending: VecDeque<SessionAction> = initial_actions.into();
        let mut left = false;

        while let Some(action) = pending.pop_front() {
            let feedback = match action {
                SessionAction::Render => {
                    if let Err(e) = self.driver.render(&self.session.view()) {
                        tracing::warn!(error = %e, "failed to render");
                    }
                    None
                },
                SessionAction::AcquireLocalMedia { ticket } => {
                    self.driver.acquire_local_media(ticket).err().map(|e| {
                        tracing::warn!(error = %e, "local media request failed");
                        SessionEvent::LocalMediaFailed {
                            ticket,
                            error: CaptureError::Unavailable(e.to_string()),
                        }
                    })
                },
                SessionAction::CaptureDesktop { ticket } => {
                    self.driver.capture_desktop(ticket).err().map(|e| {
                        tracing::warn!(error = %e, "desktop capture request failed");
                        SessionEvent::DesktopCaptureFailed {
                            ticket,
                            error: CaptureError::Unavailable(e.to_string()),
                        }
                    })
                },
                SessionAction::SendMessage { body } => {
                    Some(match self.driver.send_chat(&body).await {
                        Ok(()) => SessionEvent::MessageSent { body },
                        Err(e) => SessionEvent::SendFailed { reason: e.to_string() },
                    })
                },
                SessionAction::SendFile { attachment } => {
                    Some(match self.driver.send_file(&attachment).await {
                        Ok(()) => SessionEvent::FileSent { attachment },
                        Err(e) => SessionEvent::SendFailed { reason: e.to_string() },
                    })
                },
                SessionAction::ResumePlayback => {
                    if let Err(e) = self.driver.resume_playback() {
                        tracing::warn!(error = %e, "failed to resume playback");
                    }
                    None
                },
                SessionAction::LeaveCall => {
                    if let Err(e) = self.driver.leave_call().await {
                        tracing::warn!(error = %e, "failed to signal leave");
                    }
                    left = true;
                    None
                },
            };

            if let Some(event) = feedback {
                pending.extend(self.session.handle(event));
            }
        }
        left
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &DriverSession<E, D> {
        &self.session
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
