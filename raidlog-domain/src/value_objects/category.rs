// Tracker category value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category holding the table-wide wildcard.
pub const GLOBAL_CATEGORY: &str = "_global";
/// Identifier of the wildcard entry inside a category.
pub const WILDCARD: &str = "*";

/// Attribution paths an identifier can be resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerCategory {
    /// Thrown or launched explosives tracked through their flight.
    EntityCollision,
    /// Ammunition or projectiles that killed a structure directly.
    EntityDeathAmmo,
    /// Fire sources.
    EntityDeathFire,
    /// Held weapons and tools.
    EntityDeathWeapon,
}

impl TrackerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerCategory::EntityCollision => "entity_collision",
            TrackerCategory::EntityDeathAmmo => "entity_death_ammo",
            TrackerCategory::EntityDeathFire => "entity_death_fire",
            TrackerCategory::EntityDeathWeapon => "entity_death_weapon",
        }
    }

    pub fn all() -> [TrackerCategory; 4] {
        [
            TrackerCategory::EntityCollision,
            TrackerCategory::EntityDeathAmmo,
            TrackerCategory::EntityDeathFire,
            TrackerCategory::EntityDeathWeapon,
        ]
    }
}

impl fmt::Display for TrackerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
