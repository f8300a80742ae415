//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use huddle_app::SessionPhase;
use huddle_core::ParticipantId;

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// Reserved local identifiers never appear in the roster.
pub struct ReservedNotInRoster;

impl Invariant for ReservedNotInRoster {
    fn name(&self) -> &'static str {
        "reserved_not_in_roster"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        match state.roster.iter().find(|id| id.is_reserved()) {
            Some(id) => Err(Violation {
                invariant: self.name(),
                message: format!("reserved identifier {id} in roster {:?}", state.roster),
            }),
            None => Ok(()),
        }
    }
}

/// Tiles are the local camera, the local desktop, then the roster in join
/// order.
///
/// Remote tiles without a roster entry never render, so a stream that arrived
/// before its peer stays invisible.
pub struct TilesFollowRoster;

impl Invariant for TilesFollowRoster {
    fn name(&self) -> &'static str {
        "tiles_follow_roster"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        // Empty snapshots render nothing
        if state.tiles.is_empty() && state.roster.is_empty() {
            return Ok(());
        }

        let expected: Vec<ParticipantId> =
            [ParticipantId::local_camera(), ParticipantId::local_desktop()]
                .into_iter()
                .chain(state.roster.iter().cloned())
                .collect();
        let actual: Vec<ParticipantId> = state.tiles.iter().map(|t| t.id.clone()).collect();

        if actual != expected {
            return Err(Violation {
                invariant: self.name(),
                message: format!("tiles {actual:?}, expected {expected:?}"),
            });
        }

        for tile in &state.tiles {
            let owned = state.streams.iter().any(|(owner, _, _)| owner == &tile.id);
            if tile.has_stream && !owned {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("tile {} shows a stream the registry does not hold", tile.id),
                });
            }
        }
        Ok(())
    }
}

/// The focused participant has a tile, and it is the only active tile.
pub struct ActiveParticipantHasTile;

impl Invariant for ActiveParticipantHasTile {
    fn name(&self) -> &'static str {
        "active_participant_has_tile"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let active_tiles: Vec<_> = state.tiles.iter().filter(|t| t.is_active).collect();

        match (&state.active, active_tiles.as_slice()) {
            (None, []) => Ok(()),
            (Some(active), [tile]) if &tile.id == active => Ok(()),
            (Some(active), _) if state.tiles.is_empty() => Err(Violation {
                invariant: self.name(),
                message: format!("active participant {active} with nothing rendered"),
            }),
            (active, tiles) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "active participant {active:?} but active tiles {:?}",
                    tiles.iter().map(|t| &t.id).collect::<Vec<_>>()
                ),
            }),
        }
    }
}

/// Only the local camera tile is muted and mirrored; both local tiles are
/// local and nothing else is.
pub struct LocalCameraOnlyMirrored;

impl Invariant for LocalCameraOnlyMirrored {
    fn name(&self) -> &'static str {
        "local_camera_only_mirrored"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for tile in &state.tiles {
            let camera = tile.id.is_local_camera();
            if tile.is_muted != camera || tile.is_mirrored != camera {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "tile {}: muted={} mirrored={}",
                        tile.id, tile.is_muted, tile.is_mirrored
                    ),
                });
            }
            if tile.is_local != tile.id.is_reserved() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("tile {}: is_local={}", tile.id, tile.is_local),
                });
            }
        }
        Ok(())
    }
}

/// Chat sequence numbers strictly increase in log order.
pub struct ChatSequenceIncreasing;

impl Invariant for ChatSequenceIncreasing {
    fn name(&self) -> &'static str {
        "chat_sequence_increasing"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for window in state.chat_sequences.windows(2) {
            if window[1] <= window[0] {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("sequence {} followed by {}", window[0], window[1]),
                });
            }
        }
        Ok(())
    }
}

/// Every registry entry has a kind its owner may hold.
pub struct StreamKindsMatchOwners;

impl Invariant for StreamKindsMatchOwners {
    fn name(&self) -> &'static str {
        "stream_kinds_match_owners"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        match state.streams.iter().find(|(owner, kind, _)| !kind.is_valid_for(owner)) {
            Some((owner, kind, stream)) => Err(Violation {
                invariant: self.name(),
                message: format!("{kind:?} stream {stream} owned by {owner}"),
            }),
            None => Ok(()),
        }
    }
}

/// Live media handles are exactly the handles the session owns.
///
/// Every live stream is in the registry and every live connection belongs to
/// a roster entry, once each. Only checked when the snapshot carries ledger
/// data.
pub struct NoDanglingMedia;

impl Invariant for NoDanglingMedia {
    fn name(&self) -> &'static str {
        "no_dangling_media"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if let Some(live) = &state.live_streams {
            let mut owned: Vec<&str> = state.streams.iter().map(|(_, _, id)| id.as_str()).collect();
            owned.sort_unstable();
            let live: Vec<&str> = live.iter().map(String::as_str).collect();
            if owned != live {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("live streams {live:?}, registry holds {owned:?}"),
                });
            }
        }

        if let Some(live) = &state.live_connections {
            let mut roster = state.roster.clone();
            roster.sort();
            if &roster != live {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("live connections {live:?}, roster {roster:?}"),
                });
            }
        }
        Ok(())
    }
}

/// After leaving, the session holds no peers, streams or focus.
pub struct EndedSessionReleased;

impl Invariant for EndedSessionReleased {
    fn name(&self) -> &'static str {
        "ended_session_released"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.phase != SessionPhase::Ended {
            return Ok(());
        }
        if !state.roster.is_empty() || !state.streams.is_empty() || state.active.is_some() {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "ended session holds roster {:?}, streams {:?}, active {:?}",
                    state.roster, state.streams, state.active
                ),
            });
        }
        Ok(())
    }
}
