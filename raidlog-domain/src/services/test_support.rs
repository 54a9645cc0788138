// Hand-written collaborator fakes shared by the service tests

use std::collections::{HashMap, HashSet};

use crate::entities::{
    ActorInfo, CatalogEntry, ItemCatalog, OwnershipIgnoreTable, PolicyTable, StructureInfo,
    SuppressionRules,
};
use crate::ports::{RelationDirectory, TerritoryAdvisor, WorldQuery};
use crate::services::{ensure_wildcards, OwnershipFilter, WeaponRegistry};
use crate::value_objects::{BuildingTier, PlayerId, Vec3};

pub fn actor(id: PlayerId, name: &str) -> ActorInfo {
    ActorInfo {
        id,
        name: name.to_string(),
        team_id: 0,
        is_admin: false,
        is_npc: false,
        position: Vec3::new(0.0, 0.0, 0.0),
        height: 1.8,
        held_item: None,
    }
}

pub fn structure(entity_id: u64, owner_id: PlayerId, position: Vec3) -> StructureInfo {
    StructureInfo {
        entity_id,
        class: "assets/prefabs/building core/wall/wall.prefab".to_string(),
        shortname: "wall".to_string(),
        owner_id,
        tier: Some(BuildingTier::Stone),
        position,
        bounds_center: None,
        is_loot_container: false,
    }
}

pub fn catalog() -> ItemCatalog {
    ItemCatalog::new(vec![
        CatalogEntry {
            identifier: "explosive.timed".to_string(),
            display_name: Some("Timed Explosive Charge".to_string()),
            aliases: vec!["explosive.timed.deployed".to_string()],
        },
        CatalogEntry {
            identifier: "wall".to_string(),
            display_name: Some("Wall".to_string()),
            aliases: Vec::new(),
        },
        CatalogEntry {
            identifier: "rifle.ak".to_string(),
            display_name: Some("Assault Rifle".to_string()),
            aliases: vec!["ak47u.entity".to_string()],
        },
        CatalogEntry {
            identifier: "ammo.rifle.explosive".to_string(),
            display_name: Some("Explosive 5.56 Rifle Ammo".to_string()),
            aliases: vec!["riflebullet_explosive".to_string()],
        },
    ])
}

pub fn registry(enable_new: bool) -> WeaponRegistry {
    let mut table = PolicyTable::new();
    ensure_wildcards(&mut table);
    WeaponRegistry::with_seed(table, catalog(), enable_new, 7)
}

pub fn filter() -> OwnershipFilter {
    OwnershipFilter::new(SuppressionRules::default(), OwnershipIgnoreTable::default())
}

#[derive(Default)]
pub struct FakeRelations {
    pub names: HashMap<PlayerId, String>,
    pub teams: HashMap<PlayerId, u64>,
    pub allies: HashSet<(PlayerId, PlayerId)>,
}

impl RelationDirectory for FakeRelations {
    fn player_name(&self, player: PlayerId) -> Option<String> {
        self.names.get(&player).cloned()
    }

    fn team_of(&self, player: PlayerId) -> u64 {
        self.teams.get(&player).copied().unwrap_or_default()
    }

    fn team_label(&self, team_id: u64) -> Option<String> {
        (team_id != 0).then(|| format!("Team {}", team_id))
    }

    fn is_team_member(&self, team_id: u64, player: PlayerId) -> bool {
        self.teams.get(&player) == Some(&team_id)
    }

    fn is_clan_member_or_ally(&self, attacker: PlayerId, owner: PlayerId) -> bool {
        self.allies.contains(&(attacker, owner)) || self.allies.contains(&(owner, attacker))
    }
}

pub struct FakeTerritory {
    source: String,
    center: Vec3,
    radius: f32,
}

impl FakeTerritory {
    pub fn new(source: &str, center: Vec3, radius: f32) -> Self {
        Self {
            source: source.to_string(),
            center,
            radius,
        }
    }
}

impl TerritoryAdvisor for FakeTerritory {
    fn source(&self) -> &str {
        &self.source
    }

    fn is_protected(&self, position: Vec3) -> bool {
        position.distance(self.center) <= self.radius
    }
}

/// Every structure within `radius + max_distance` of the cast origin is a candidate.
#[derive(Default)]
pub struct FakeWorld {
    pub structures: Vec<StructureInfo>,
    pub obstructed: HashSet<u64>,
}

impl WorldQuery for FakeWorld {
    fn sphere_cast(
        &self,
        origin: Vec3,
        _direction: Vec3,
        radius: f32,
        max_distance: f32,
    ) -> Vec<StructureInfo> {
        self.structures
            .iter()
            .filter(|structure| structure.center().distance(origin) <= radius + max_distance)
            .cloned()
            .collect()
    }

    fn is_visible(&self, _from: Vec3, target: &StructureInfo) -> bool {
        !self.obstructed.contains(&target.entity_id)
    }
}
