// Identifier value objects

use serde::{Deserialize, Serialize};

/// Position of a record in the event log, stamped with the log generation it was issued under.
///
/// Any deletion or wipe bumps the generation, so an index taken before the mutation can no
/// longer address a record silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventIndex {
    pub position: usize,
    pub generation: u64,
}

/// Host-assigned id of a live spawned entity.
pub type InstanceId = u64;

/// Stable account id of a player; 0 means "nobody".
pub type PlayerId = u64;
