//! Core components for Huddle call sessions.
//!
//! Leaf state owned by a call session, with no I/O and no async. Each
//! component owns its entities and records change notifications that only the
//! session coordinator consumes.
//!
//! # Components
//!
//! - [`StreamRegistry`]: participant → attached media streams. The only place
//!   that releases a media handle.
//! - [`PeerRoster`]: participant → peer connection and its lifecycle state.
//! - [`ChatLog`]: append-only messages with an unread counter.
//! - [`NotificationCenter`]: active user-facing notifications.
//! - [`Environment`]: time source, real or virtual.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chat;
pub mod env;
pub mod error;
pub mod media;
pub mod notify;
pub mod participant;
pub mod roster;
pub mod streams;

pub use chat::{Attachment, ChatLog, ChatMessage};
pub use env::{Environment, SystemEnv};
pub use error::{CaptureError, MediaError, RegistryError, RosterError};
pub use media::{MediaStream, PeerConnection, StreamId, StreamKind, TrackKind};
pub use notify::{Notification, NotificationCenter, NotificationId, NotificationLevel};
pub use participant::{LOCAL_CAMERA, LOCAL_DESKTOP, ParticipantId};
pub use roster::{PeerEntry, PeerRoster, PeerState, RosterChange};
pub use streams::{StreamChange, StreamEntry, StreamRegistry};
