//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during a session.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The invariant system extracts observable state from a session (and
//! optionally the media ledger) into a [`SessionSnapshot`], then runs
//! registered [`Invariant`] checks against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SessionSnapshot::from_session(&session).with_ledger(&ledger);
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    ActiveParticipantHasTile, ChatSequenceIncreasing, EndedSessionReleased,
    LocalCameraOnlyMirrored, NoDanglingMedia, ReservedNotInRoster, StreamKindsMatchOwners,
    TilesFollowRoster,
};
pub use snapshot::{SessionSnapshot, TileSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against session state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`ReservedNotInRoster`]: local identifiers never join the roster
    /// - [`TilesFollowRoster`]: tiles are local camera, local desktop, roster
    /// - [`ActiveParticipantHasTile`]: focus points at a rendered tile
    /// - [`LocalCameraOnlyMirrored`]: only the local camera is muted/mirrored
    /// - [`ChatSequenceIncreasing`]: chat sequences strictly increase
    /// - [`StreamKindsMatchOwners`]: stream kinds agree with their owners
    /// - [`NoDanglingMedia`]: live handles are exactly the owned handles
    /// - [`EndedSessionReleased`]: nothing is held after leaving
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ReservedNotInRoster);
        registry.add(TilesFollowRoster);
        registry.add(ActiveParticipantHasTile);
        registry.add(LocalCameraOnlyMirrored);
        registry.add(ChatSequenceIncreasing);
        registry.add(StreamKindsMatchOwners);
        registry.add(NoDanglingMedia);
        registry.add(EndedSessionReleased);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on any violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        let snapshot = SessionSnapshot::empty();
        assert!(registry.check_all(&snapshot).is_ok());
    }
}
