// World mirror
// Host-fed copy of the structures, players, teams, alliances and protected zones the engine
// asks about while attributing events.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use raidlog_domain::{
    ActorInfo, AllianceRecord, PlayerId, PlayerRecord, RelationDirectory, StructureInfo,
    TeamRecord, TerritoryAdvisor, TerritoryZone, Vec3, WorldQuery, WorldSync,
};

/// Source name reported when a declared zone suppresses an event.
pub const DECLARED_ZONES_SOURCE: &str = "declared_zones";
/// Structures whose center lies this close to a line of sight block it.
pub const OCCLUSION_RADIUS: f32 = 0.75;

#[derive(Default)]
struct MirrorState {
    structures: HashMap<u64, StructureInfo>,
    players: HashMap<PlayerId, PlayerRecord>,
    teams: HashMap<u64, TeamRecord>,
    friendly: HashMap<PlayerId, HashSet<PlayerId>>,
    zones: Vec<TerritoryZone>,
}

#[derive(Default)]
pub struct WorldMirror {
    state: RwLock<MirrorState>,
}

impl WorldMirror {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MirrorState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MirrorState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn structure_count(&self) -> usize {
        self.read().structures.len()
    }

    pub fn zone_count(&self) -> usize {
        self.read().zones.len()
    }
}

/// Closest distance from `point` to the segment `start..end`.
fn distance_to_segment(point: Vec3, start: Vec3, end: Vec3) -> f32 {
    let segment = end.sub(start);
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }
    let t = (point.sub(start).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(start.add(segment.scale(t)))
}

impl WorldQuery for WorldMirror {
    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
    ) -> Vec<StructureInfo> {
        let heading = direction.normalized();
        let state = self.read();
        let hits: Vec<StructureInfo> = if heading == Vec3::ZERO {
            state
                .structures
                .values()
                .filter(|structure| structure.center().distance(origin) <= radius + max_distance)
                .cloned()
                .collect()
        } else {
            let end = origin.add(heading.scale(max_distance));
            state
                .structures
                .values()
                .filter(|structure| distance_to_segment(structure.center(), origin, end) <= radius)
                .cloned()
                .collect()
        };
        debug!(hits = hits.len(), %origin, radius, "sphere cast");
        hits
    }

    fn is_visible(&self, from: Vec3, target: &StructureInfo) -> bool {
        let to = target.center();
        let reach = from.distance(to);
        let state = self.read();
        !state.structures.values().any(|other| {
            other.entity_id != target.entity_id
                && other.center().distance(from) < reach
                && other.center().distance(to) > OCCLUSION_RADIUS
                && distance_to_segment(other.center(), from, to) < OCCLUSION_RADIUS
        })
    }
}

impl RelationDirectory for WorldMirror {
    fn player_name(&self, player: PlayerId) -> Option<String> {
        self.read()
            .players
            .get(&player)
            .map(|record| record.name.clone())
    }

    fn team_of(&self, player: PlayerId) -> u64 {
        let state = self.read();
        if let Some(record) = state.players.get(&player) {
            if record.team_id != 0 {
                return record.team_id;
            }
        }
        state
            .teams
            .values()
            .find(|team| team.members.contains(&player))
            .map(|team| team.team_id)
            .unwrap_or(0)
    }

    fn team_label(&self, team_id: u64) -> Option<String> {
        let state = self.read();
        let team = state.teams.get(&team_id)?;
        let leader = team.leader_name.as_deref().unwrap_or("Unknown Leader");
        Some(format!("{}'s Team (ID: {})", leader, team_id))
    }

    fn is_team_member(&self, team_id: u64, player: PlayerId) -> bool {
        if team_id == 0 {
            return false;
        }
        let state = self.read();
        state
            .teams
            .get(&team_id)
            .is_some_and(|team| team.members.contains(&player))
            || state
                .players
                .get(&player)
                .is_some_and(|record| record.team_id == team_id)
    }

    fn is_clan_member_or_ally(&self, attacker: PlayerId, owner: PlayerId) -> bool {
        let state = self.read();
        let lists = |player: PlayerId, other: PlayerId| {
            state
                .friendly
                .get(&player)
                .is_some_and(|friends| friends.contains(&other))
        };
        lists(owner, attacker) || lists(attacker, owner)
    }
}

impl TerritoryAdvisor for WorldMirror {
    fn source(&self) -> &str {
        DECLARED_ZONES_SOURCE
    }

    fn is_protected(&self, position: Vec3) -> bool {
        self.read()
            .zones
            .iter()
            .any(|zone| zone.center.distance(position) <= zone.radius)
    }
}

impl WorldSync for WorldMirror {
    fn observe_actor(&self, actor: &ActorInfo) {
        if actor.is_npc || actor.id == 0 {
            return;
        }
        let mut state = self.write();
        let record = state.players.entry(actor.id).or_insert_with(|| PlayerRecord {
            id: actor.id,
            name: actor.name.clone(),
            team_id: actor.team_id,
        });
        record.name = actor.name.clone();
        record.team_id = actor.team_id;
    }

    fn observe_players(&self, players: &[PlayerRecord], teams: &[TeamRecord]) {
        let mut state = self.write();
        for player in players {
            state.players.insert(player.id, player.clone());
        }
        for team in teams {
            if team.members.is_empty() {
                state.teams.remove(&team.team_id);
            } else {
                state.teams.insert(team.team_id, team.clone());
            }
        }
    }

    fn observe_structures(&self, upserts: &[StructureInfo], removed: &[u64]) {
        let mut state = self.write();
        for structure in upserts {
            state
                .structures
                .insert(structure.entity_id, structure.clone());
        }
        for entity_id in removed {
            state.structures.remove(entity_id);
        }
    }

    fn observe_alliances(&self, alliances: &[AllianceRecord]) {
        let mut state = self.write();
        for alliance in alliances {
            state.friendly.insert(
                alliance.player_id,
                alliance.friendly_ids.iter().copied().collect(),
            );
        }
    }

    fn declare_territory(&self, zone: TerritoryZone) {
        let mut state = self.write();
        state
            .zones
            .retain(|existing| !(existing.source == zone.source && existing.zone_id == zone.zone_id));
        debug!(source = %zone.source, zone = %zone.zone_id, radius = zone.radius, "territory declared");
        state.zones.push(zone);
    }

    fn clear_territory(&self, source: &str, zone_id: &str) {
        self.write()
            .zones
            .retain(|zone| !(zone.source == source && zone.zone_id == zone_id));
    }
}
