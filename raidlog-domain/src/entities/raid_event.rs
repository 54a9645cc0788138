// Raid event entity
// One attributed act of destruction or collision against player-owned property

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{
    BuildingTier, EventIndex, EventOutcome, PlayerId, TrackerCategory, Vec3,
};

/// Target label recorded when an always-logged explosive resolved without touching anything.
pub const UNKNOWN_TARGET: &str = "unknown_entity";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponRef {
    pub identifier: String,
    pub category: TrackerCategory,
}

impl WeaponRef {
    pub fn new(identifier: impl Into<String>, category: TrackerCategory) -> Self {
        Self {
            identifier: identifier.into(),
            category,
        }
    }
}

impl fmt::Display for WeaponRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.identifier, self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDescriptor {
    pub primary: WeaponRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<WeaponRef>,
}

impl WeaponDescriptor {
    pub fn single(primary: WeaponRef) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn composite(primary: WeaponRef, secondary: WeaponRef) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn category(&self) -> TrackerCategory {
        self.primary.category
    }

    pub fn refs(&self) -> impl Iterator<Item = &WeaponRef> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }
}

impl fmt::Display for WeaponDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(secondary) => write!(f, "{};{}", self.primary, secondary),
            None => write!(f, "{}", self.primary),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub shortname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<BuildingTier>,
}

impl TargetDescriptor {
    pub fn new(shortname: impl Into<String>, tier: Option<BuildingTier>) -> Self {
        Self {
            shortname: shortname.into(),
            tier,
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TARGET, None)
    }

    /// Catalog key of the target: the short name, tier-qualified for building blocks.
    pub fn label(&self) -> String {
        match self.tier {
            Some(tier) => format!("{}.{}", self.shortname, tier.suffix()),
            None => self.shortname.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidEvent {
    pub attacker_id: PlayerId,
    pub attacker_name: String,
    #[serde(default)]
    pub attacker_team_id: u64,
    pub victim_owner_id: PlayerId,
    pub weapon: WeaponDescriptor,
    pub outcome: EventOutcome,
    pub target: TargetDescriptor,
    pub origin: Vec3,
    pub target_position: Vec3,
    pub timestamp: DateTime<Utc>,
}

impl RaidEvent {
    pub fn is_near(&self, point: Vec3, radius: f32) -> bool {
        point.distance(self.origin) < radius || point.distance(self.target_position) < radius
    }
}

/// A freshly attributed event together with the class of the structure it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedEvent {
    pub event: RaidEvent,
    pub target_class: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexedEvent {
    pub index: EventIndex,
    pub event: RaidEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_descriptor_renders_both_refs() {
        let descriptor = WeaponDescriptor::composite(
            WeaponRef::new("rifle.ak", TrackerCategory::EntityDeathWeapon),
            WeaponRef::new("ammo.rifle.explosive", TrackerCategory::EntityDeathAmmo),
        );
        assert_eq!(
            descriptor.to_string(),
            "rifle.ak[entity_death_weapon];ammo.rifle.explosive[entity_death_ammo]"
        );
        assert_eq!(descriptor.refs().count(), 2);
    }

    #[test]
    fn tiered_target_label_carries_suffix() {
        let target = TargetDescriptor::new("wall", Some(BuildingTier::Stone));
        assert_eq!(target.label(), "wall.stone");
        assert_eq!(TargetDescriptor::unknown().label(), UNKNOWN_TARGET);
    }
}
