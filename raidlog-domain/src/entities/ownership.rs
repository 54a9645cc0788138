// Ownership suppression entities

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::BuildingTier;

/// Per object-class switches, keyed by the full class identifier of the structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipIgnoreEntry {
    pub name: String,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub ignore_external_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnershipIgnoreTable {
    entries: BTreeMap<String, OwnershipIgnoreEntry>,
}

impl OwnershipIgnoreTable {
    pub fn get(&self, class: &str) -> Option<&OwnershipIgnoreEntry> {
        self.entries.get(class)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.entries.contains_key(class)
    }

    pub fn insert(&mut self, class: &str, entry: OwnershipIgnoreEntry) {
        self.entries.insert(class.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Global suppression switches.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionRules {
    pub ignore_same_owner: bool,
    pub ignore_team_member: bool,
    pub ignore_clan_member_or_ally: bool,
    pub ignored_tiers: BTreeSet<BuildingTier>,
}

impl Default for SuppressionRules {
    fn default() -> Self {
        Self {
            ignore_same_owner: true,
            ignore_team_member: true,
            ignore_clan_member_or_ally: true,
            ignored_tiers: BTreeSet::from([BuildingTier::Twigs]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionReason {
    LootContainer,
    Unowned,
    IgnoredClass,
    IgnoredTier(BuildingTier),
    ProtectedTerritory(String),
    SameOwner,
    TeamMember,
    ClanMemberOrAlly,
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressionReason::LootContainer => f.write_str("loot container"),
            SuppressionReason::Unowned => f.write_str("unowned"),
            SuppressionReason::IgnoredClass => f.write_str("ignored class"),
            SuppressionReason::IgnoredTier(tier) => write!(f, "ignored tier {}", tier.suffix()),
            SuppressionReason::ProtectedTerritory(source) => {
                write!(f, "protected territory ({})", source)
            }
            SuppressionReason::SameOwner => f.write_str("same owner"),
            SuppressionReason::TeamMember => f.write_str("team member"),
            SuppressionReason::ClanMemberOrAlly => f.write_str("clan member or ally"),
        }
    }
}
