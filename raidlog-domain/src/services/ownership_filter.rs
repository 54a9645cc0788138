use std::sync::Arc;

use tracing::info;

use crate::entities::{
    ActorInfo, OwnershipIgnoreEntry, OwnershipIgnoreTable, StructureInfo, SuppressionReason,
    SuppressionRules,
};
use crate::ports::{RelationDirectory, TerritoryAdvisor};

/// Decides whether damage to a structure is withheld from the log.
///
/// The checks themselves are pure. The only mutation is lazy registration of object classes the
/// ignore table has never seen, which the caller persists through [`OwnershipFilter::take_dirty`].
pub struct OwnershipFilter {
    rules: SuppressionRules,
    ignore_table: OwnershipIgnoreTable,
    dirty: bool,
}

impl OwnershipFilter {
    pub fn new(rules: SuppressionRules, ignore_table: OwnershipIgnoreTable) -> Self {
        Self {
            rules,
            ignore_table,
            dirty: false,
        }
    }

    pub fn rules(&self) -> &SuppressionRules {
        &self.rules
    }

    pub fn ignore_table(&self) -> &OwnershipIgnoreTable {
        &self.ignore_table
    }

    /// Adds an entry for a class on first encounter; returns true if it was new.
    pub fn observe_class(&mut self, target: &StructureInfo, name: String) -> bool {
        if target.class.is_empty() || self.ignore_table.contains(&target.class) {
            return false;
        }
        info!(
            target: "raidlog::audit",
            "added ownership entry {} for class {}",
            name,
            target.class
        );
        self.ignore_table.insert(
            &target.class,
            OwnershipIgnoreEntry {
                name,
                ignore: false,
                ignore_external_only: false,
            },
        );
        self.dirty = true;
        true
    }

    /// Checks that depend only on the structure.
    pub fn entity_suppression(
        &self,
        target: &StructureInfo,
        territories: &[Arc<dyn TerritoryAdvisor>],
    ) -> Option<SuppressionReason> {
        if target.is_loot_container {
            return Some(SuppressionReason::LootContainer);
        }
        if target.owner_id == 0 {
            return Some(SuppressionReason::Unowned);
        }
        if self
            .ignore_table
            .get(&target.class)
            .map(|entry| entry.ignore)
            .unwrap_or(false)
        {
            return Some(SuppressionReason::IgnoredClass);
        }
        if let Some(tier) = target.tier.filter(|tier| self.rules.ignored_tiers.contains(tier)) {
            return Some(SuppressionReason::IgnoredTier(tier));
        }
        territories
            .iter()
            .find(|advisor| advisor.is_protected(target.center()))
            .map(|advisor| SuppressionReason::ProtectedTerritory(advisor.source().to_string()))
    }

    pub fn suppression_reason(
        &self,
        target: &StructureInfo,
        attacker: Option<&ActorInfo>,
        relations: &dyn RelationDirectory,
        territories: &[Arc<dyn TerritoryAdvisor>],
    ) -> Option<SuppressionReason> {
        if let Some(reason) = self.entity_suppression(target, territories) {
            return Some(reason);
        }
        let attacker = attacker?;
        if attacker.is_admin {
            return None;
        }
        let owner = target.owner_id;
        if self.rules.ignore_same_owner && attacker.id == owner {
            return Some(SuppressionReason::SameOwner);
        }
        if self.rules.ignore_team_member {
            let team_id = match attacker.team_id {
                0 => relations.team_of(attacker.id),
                team_id => team_id,
            };
            if team_id != 0 && relations.is_team_member(team_id, owner) {
                return Some(SuppressionReason::TeamMember);
            }
        }
        if self.rules.ignore_clan_member_or_ally
            && relations.is_clan_member_or_ally(attacker.id, owner)
        {
            return Some(SuppressionReason::ClanMemberOrAlly);
        }
        None
    }

    /// Whether events against this class stay off the outbound webhook.
    pub fn skips_external(&self, class: &str) -> bool {
        self.ignore_table
            .get(class)
            .map(|entry| entry.ignore_external_only)
            .unwrap_or(false)
    }

    pub fn take_dirty(&mut self) -> Option<OwnershipIgnoreTable> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.ignore_table.clone())
    }
}
