use std::sync::Arc;

use tracing::debug;

use crate::entities::{ActorInfo, StructureInfo, SuppressionReason};
use crate::ports::{RelationDirectory, TerritoryAdvisor, WorldQuery};
use crate::services::{OwnershipFilter, WeaponRegistry};

/// Host-side collaborators consulted while attributing one signal.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub world: &'a dyn WorldQuery,
    pub relations: &'a dyn RelationDirectory,
    pub territories: &'a [Arc<dyn TerritoryAdvisor>],
}

/// Everything an attribution step reads or registers into, borrowed for one call.
pub struct AttributionContext<'a> {
    pub registry: &'a mut WeaponRegistry,
    pub filter: &'a mut OwnershipFilter,
    pub world: &'a dyn WorldQuery,
    pub relations: &'a dyn RelationDirectory,
    pub territories: &'a [Arc<dyn TerritoryAdvisor>],
}

impl<'a> AttributionContext<'a> {
    pub fn new(
        registry: &'a mut WeaponRegistry,
        filter: &'a mut OwnershipFilter,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            registry,
            filter,
            world: collaborators.world,
            relations: collaborators.relations,
            territories: collaborators.territories,
        }
    }

    /// Registers the structure's class if unseen, then runs the suppression checks.
    pub fn suppression(
        &mut self,
        target: &StructureInfo,
        attacker: Option<&ActorInfo>,
    ) -> Option<SuppressionReason> {
        if !self.filter.ignore_table().contains(&target.class) {
            let name = format!(
                "{} ({})",
                self.registry.pretty_name(&target.target().label()),
                self.registry.catalog().item_for(&target.shortname)
            );
            self.filter.observe_class(target, name);
        }
        let reason =
            self.filter
                .suppression_reason(target, attacker, self.relations, self.territories);
        if let Some(reason) = &reason {
            debug!(
                class = %target.class,
                owner = target.owner_id,
                attacker = attacker.map(|actor| actor.id).unwrap_or_default(),
                %reason,
                "event suppressed"
            );
        }
        reason
    }

    pub fn team_of(&self, actor: &ActorInfo) -> u64 {
        match actor.team_id {
            0 => self.relations.team_of(actor.id),
            team_id => team_id,
        }
    }
}
