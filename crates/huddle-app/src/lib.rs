//! Application layer for Huddle call sessions.
//!
//! A pure session coordinator plus a generic runtime, so the same
//! orchestration code runs in the browser and in deterministic simulation.
//!
//! # Components
//!
//! - [`Session`]: the coordinator. Consumes [`SessionEvent`]s and local
//!   [`Intent`]s, owns the registry, roster, chat log and notifications, and
//!   returns [`SessionAction`]s.
//! - [`ViewModel`]: render description derived from current session state.
//! - [`Driver`]: platform I/O (presentation, capture, chat transport).
//! - [`SessionInbox`]/[`SessionSender`]: one channel per event source.
//! - [`Runtime`]: single-threaded reducer loop tying them together.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod driver;
mod error;
mod event;
mod inbox;
mod runtime;
mod session;
mod view;

pub use action::{CaptureTicket, SessionAction};
pub use config::SessionConfig;
pub use driver::Driver;
pub use error::SessionError;
pub use event::{Intent, SessionEvent};
pub use inbox::{EventSource, SessionInbox, SessionSender, channel};
pub use runtime::Runtime;
pub use session::{Session, SessionPhase};
pub use view::{NotificationView, Tile, TileStream, Toolbar, ViewModel};
