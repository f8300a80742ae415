//! Session error types.
//!
//! Every event handler in the coordinator returns `Result<_, SessionError>`.
//! Errors stop at the coordinator boundary: they are logged and turned into
//! an error notification, and the session carries on.

use huddle_core::{RegistryError, RosterError};
use thiserror::Error;

/// Errors raised while applying an event to the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Event arrived before [`crate::Session::initialize`].
    #[error("session not initialized")]
    NotInitialized,

    /// Stream registry rejected the operation.
    #[error("stream registry: {0}")]
    Registry(#[from] RegistryError),

    /// Peer roster rejected the operation.
    #[error("peer roster: {0}")]
    Roster(#[from] RosterError),
}

#[cfg(test)]
mod tests {
    use huddle_core::ParticipantId;

    use super::*;

    #[test]
    fn roster_errors_convert() {
        let err: SessionError = RosterError::UnknownPeer(ParticipantId::from("p9")).into();
        assert_eq!(err.to_string(), "peer roster: unknown peer p9");
    }
}
