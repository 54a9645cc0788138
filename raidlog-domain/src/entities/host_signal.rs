// Host signal entities
// What the simulation host reports about live actors, structures and explosives

use serde::{Deserialize, Serialize};

use crate::entities::TargetDescriptor;
use crate::value_objects::{BuildingTier, InstanceId, PlayerId, Vec3};

fn default_actor_height() -> f32 {
    1.8
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldItem {
    pub identifier: String,
    #[serde(default)]
    pub is_attack_weapon: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_ammo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub team_id: u64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_npc: bool,
    pub position: Vec3,
    #[serde(default = "default_actor_height")]
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held_item: Option<HeldItem>,
}

impl ActorInfo {
    /// Approximate eye position, used as the origin of direct attacks.
    pub fn eye_position(&self) -> Vec3 {
        self.position.lifted(self.height - 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub entity_id: u64,
    /// Full class identifier (prefab path) of the structure.
    pub class: String,
    pub shortname: String,
    #[serde(default)]
    pub owner_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<BuildingTier>,
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds_center: Option<Vec3>,
    #[serde(default)]
    pub is_loot_container: bool,
}

impl StructureInfo {
    pub fn target(&self) -> TargetDescriptor {
        TargetDescriptor::new(self.shortname.clone(), self.tier)
    }

    pub fn center(&self) -> Vec3 {
        self.bounds_center.unwrap_or(self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplosiveKind {
    #[default]
    Thrown,
    Timed,
    Dud,
    Rocket,
    ArtilleryRocket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSignal {
    pub instance_id: InstanceId,
    /// Short class name of the spawned explosive.
    pub identifier: String,
    #[serde(default)]
    pub kind: ExplosiveKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<ActorInfo>,
    pub position: Vec3,
    #[serde(default)]
    pub facing: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blast_radius: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSample {
    pub instance_id: InstanceId,
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<StructureInfo>,
    #[serde(default = "default_true")]
    pub armed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DespawnSignal {
    pub instance_id: InstanceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    #[default]
    Generic,
    Heat,
    Explosion,
    Bullet,
    Slash,
    Blunt,
    Stab,
    Arrow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Initiator {
    Player(ActorInfo),
    Fireball {
        identifier: String,
        #[serde(default)]
        creator: Option<ActorInfo>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageSignal {
    pub target: StructureInfo,
    pub initiator: Initiator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_prefab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectile_prefab: Option<String>,
    #[serde(default)]
    pub majority_damage: DamageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_position: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub team_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: u64,
    #[serde(default)]
    pub leader_name: Option<String>,
    #[serde(default)]
    pub members: Vec<PlayerId>,
}

/// Clan membership and alliances, flattened to "these players are friendly to this player".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllianceRecord {
    pub player_id: PlayerId,
    #[serde(default)]
    pub friendly_ids: Vec<PlayerId>,
}

/// A protected area declared by a third-party event system on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryZone {
    pub source: String,
    pub zone_id: String,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum HostSignal {
    Spawn(SpawnSignal),
    Tick(TickSample),
    Despawn(DespawnSignal),
    Damage(DamageSignal),
    ArtilleryFired {
        launcher_position: Vec3,
        operator: ActorInfo,
    },
    ArtilleryEnded {
        launcher_position: Vec3,
    },
    WorldReset,
    Save,
    Players {
        #[serde(default)]
        players: Vec<PlayerRecord>,
        #[serde(default)]
        teams: Vec<TeamRecord>,
    },
    Structures {
        #[serde(default)]
        upserts: Vec<StructureInfo>,
        #[serde(default)]
        removed: Vec<u64>,
    },
    Alliances {
        alliances: Vec<AllianceRecord>,
    },
    TerritoryDeclared(TerritoryZone),
    TerritoryCleared {
        source: String,
        zone_id: String,
    },
}

impl HostSignal {
    pub fn kind(&self) -> &'static str {
        match self {
            HostSignal::Spawn(_) => "spawn",
            HostSignal::Tick(_) => "tick",
            HostSignal::Despawn(_) => "despawn",
            HostSignal::Damage(_) => "damage",
            HostSignal::ArtilleryFired { .. } => "artillery_fired",
            HostSignal::ArtilleryEnded { .. } => "artillery_ended",
            HostSignal::WorldReset => "world_reset",
            HostSignal::Save => "save",
            HostSignal::Players { .. } => "players",
            HostSignal::Structures { .. } => "structures",
            HostSignal::Alliances { .. } => "alliances",
            HostSignal::TerritoryDeclared(_) => "territory_declared",
            HostSignal::TerritoryCleared { .. } => "territory_cleared",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignalEnvelope {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub signals: Vec<HostSignal>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub signals: usize,
    pub recorded: usize,
    pub in_flight: usize,
    pub log_size: usize,
}

/// Short class name of a prefab path: directory and ".prefab" stripped.
pub fn prefab_shortname(prefab: &str) -> String {
    let name = prefab.rsplit('/').next().unwrap_or(prefab);
    name.strip_suffix(".prefab").unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefab_shortname_strips_path_and_suffix() {
        assert_eq!(
            prefab_shortname("assets/prefabs/tools/c4/explosive.timed.deployed.prefab"),
            "explosive.timed.deployed"
        );
        assert_eq!(prefab_shortname("rocket_basic"), "rocket_basic");
    }

    #[test]
    fn signals_decode_from_tagged_json() {
        let raw = r#"[
            {"signal":"spawn","instance_id":7,"identifier":"explosive.timed.deployed",
             "creator":{"id":1,"name":"a","position":{"x":1.0,"y":2.0,"z":3.0}},
             "position":{"x":10.0,"y":0.0,"z":10.0}},
            {"signal":"world_reset"},
            {"signal":"damage","target":{"entity_id":3,"class":"assets/wall.prefab","shortname":"wall",
             "owner_id":9,"position":{"x":0.0,"y":0.0,"z":0.0}},
             "initiator":{"type":"fireball","identifier":"fireball_small"}}
        ]"#;
        let signals: Vec<HostSignal> = serde_json::from_str(raw).expect("signals");
        assert_eq!(signals.len(), 3);
        match &signals[0] {
            HostSignal::Spawn(spawn) => {
                assert_eq!(spawn.kind, ExplosiveKind::Thrown);
                let creator = spawn.creator.as_ref().expect("creator");
                assert!((creator.height - 1.8).abs() < f32::EPSILON);
            }
            other => panic!("unexpected signal {:?}", other),
        }
        assert_eq!(signals[1], HostSignal::WorldReset);
        match &signals[2] {
            HostSignal::Damage(damage) => {
                assert!(matches!(damage.initiator, Initiator::Fireball { .. }));
            }
            other => panic!("unexpected signal {:?}", other),
        }
    }
}
