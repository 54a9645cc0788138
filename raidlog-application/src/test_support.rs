// In-memory ports and a ready AppState for the command and query tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use raidlog_domain::ports::{
    DeliveryService, EventLogRepository, PolicyRepository, RelationDirectory, WorldQuery,
    WorldSync,
};
use raidlog_domain::services::{
    ensure_wildcards, ExplosiveTracker, OwnershipFilter, RaidEngine, RaidEventStore,
    WeaponRegistry,
};
use raidlog_domain::value_objects::{
    BuildingTier, EventOutcome, PlayerId, TrackerCategory, Vec3, GLOBAL_CATEGORY, WILDCARD,
};
use raidlog_domain::{
    ActorInfo, AllianceRecord, CatalogEntry, DeliveryItem, DeliveryRecord, ItemCatalog,
    OwnershipIgnoreTable, PlayerRecord, PolicyTable, RaidEvent, RuntimeConfig, StructureInfo,
    SuppressionRules, TargetDescriptor, TeamRecord, TerritoryZone, WeaponDescriptor,
    WeaponPolicy, WeaponRef,
};
use tokio::sync::{Mutex, RwLock};

use crate::{AppState, BroadcastHub, Metrics};

pub const WALL_CLASS: &str = "assets/prefabs/building core/wall/wall.prefab";

#[derive(Default)]
pub struct MemoryEvents {
    pub saved: StdMutex<Vec<RaidEvent>>,
    pub fail_saves: bool,
}

impl MemoryEvents {
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EventLogRepository for MemoryEvents {
    async fn load_events(&self) -> anyhow::Result<Vec<RaidEvent>> {
        Ok(self.saved.lock().expect("lock").clone())
    }

    async fn save_events(&self, events: &[RaidEvent]) -> anyhow::Result<()> {
        if self.fail_saves {
            return Err(anyhow!("disk full"));
        }
        *self.saved.lock().expect("lock") = events.to_vec();
        Ok(())
    }

    async fn archive_events(&self, label: &str, _events: &[RaidEvent]) -> anyhow::Result<String> {
        Ok(label.to_string())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPolicies {
    policies: StdMutex<Option<PolicyTable>>,
}

#[async_trait]
impl PolicyRepository for MemoryPolicies {
    async fn load_policy_table(&self) -> anyhow::Result<Option<PolicyTable>> {
        Ok(self.policies.lock().expect("lock").clone())
    }

    async fn save_policy_table(&self, table: &PolicyTable) -> anyhow::Result<()> {
        *self.policies.lock().expect("lock") = Some(table.clone());
        Ok(())
    }

    async fn load_ignore_table(&self) -> anyhow::Result<OwnershipIgnoreTable> {
        Ok(OwnershipIgnoreTable::default())
    }

    async fn save_ignore_table(&self, _table: &OwnershipIgnoreTable) -> anyhow::Result<()> {
        Ok(())
    }

    async fn load_catalog(&self) -> anyhow::Result<Vec<CatalogEntry>> {
        Ok(Vec::new())
    }

    async fn save_catalog(&self, _entries: &[CatalogEntry]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Structures within the cast reach, all visible; no relations at all.
#[derive(Default)]
pub struct FlatWorld {
    pub structures: Vec<StructureInfo>,
}

impl WorldQuery for FlatWorld {
    fn sphere_cast(&self, origin: Vec3, _d: Vec3, radius: f32, max: f32) -> Vec<StructureInfo> {
        self.structures
            .iter()
            .filter(|s| s.center().distance(origin) <= radius + max)
            .cloned()
            .collect()
    }

    fn is_visible(&self, _from: Vec3, _target: &StructureInfo) -> bool {
        true
    }
}

impl RelationDirectory for FlatWorld {
    fn player_name(&self, _player: PlayerId) -> Option<String> {
        Some("B".to_string())
    }
    fn team_of(&self, _player: PlayerId) -> u64 {
        0
    }
    fn team_label(&self, _team_id: u64) -> Option<String> {
        None
    }
    fn is_team_member(&self, _team_id: u64, _player: PlayerId) -> bool {
        false
    }
    fn is_clan_member_or_ally(&self, _attacker: PlayerId, _owner: PlayerId) -> bool {
        false
    }
}

impl WorldSync for FlatWorld {
    fn observe_actor(&self, _actor: &ActorInfo) {}
    fn observe_players(&self, _players: &[PlayerRecord], _teams: &[TeamRecord]) {}
    fn observe_structures(&self, _upserts: &[StructureInfo], _removed: &[u64]) {}
    fn observe_alliances(&self, _alliances: &[AllianceRecord]) {}
    fn declare_territory(&self, _zone: TerritoryZone) {}
    fn clear_territory(&self, _source: &str, _zone_id: &str) {}
}

#[derive(Default)]
pub struct CollectingDelivery {
    pub items: StdMutex<Vec<DeliveryItem>>,
}

#[async_trait]
impl DeliveryService for CollectingDelivery {
    fn enqueue(&self, item: DeliveryItem) -> bool {
        self.items.lock().expect("lock").push(item);
        true
    }
    fn pending(&self) -> usize {
        self.items.lock().expect("lock").len()
    }
    async fn list_deliveries(&self, _limit: usize) -> Vec<DeliveryRecord> {
        Vec::new()
    }
    async fn last_delivery(&self) -> Option<DeliveryRecord> {
        None
    }
}

pub fn wall(owner_id: PlayerId, position: Vec3) -> StructureInfo {
    StructureInfo {
        entity_id: 1,
        class: WALL_CLASS.to_string(),
        shortname: "wall".to_string(),
        owner_id,
        tier: Some(BuildingTier::Stone),
        position,
        bounds_center: None,
        is_loot_container: false,
    }
}

pub fn raider() -> ActorInfo {
    ActorInfo {
        id: 10,
        name: "A".to_string(),
        team_id: 0,
        is_admin: false,
        is_npc: false,
        position: Vec3::new(90.0, 0.0, 100.0),
        height: 1.8,
        held_item: None,
    }
}

/// A stored event near the origin, for tests that seed the log directly.
pub fn recorded_event(attacker_id: PlayerId, victim_owner_id: PlayerId) -> RaidEvent {
    let at = Vec3::new(1.0, 0.0, 1.0);
    RaidEvent {
        attacker_id,
        attacker_name: format!("player{}", attacker_id),
        attacker_team_id: 0,
        victim_owner_id,
        weapon: WeaponDescriptor::single(WeaponRef::new(
            "explosive.timed.deployed",
            TrackerCategory::EntityCollision,
        )),
        outcome: EventOutcome::Hit,
        target: TargetDescriptor::new("wall", None),
        origin: at,
        target_position: at,
        timestamp: Utc::now(),
    }
}

pub fn state_with(
    world: FlatWorld,
    delivery: Arc<CollectingDelivery>,
    events: Arc<MemoryEvents>,
) -> AppState {
    state_with_ignores(world, delivery, events, OwnershipIgnoreTable::default())
}

/// State whose global wildcard turns every weapon on with console, broadcast and external
/// notifications.
pub fn state_with_ignores(
    world: FlatWorld,
    delivery: Arc<CollectingDelivery>,
    events: Arc<MemoryEvents>,
    ignores: OwnershipIgnoreTable,
) -> AppState {
    let mut table = PolicyTable::new();
    ensure_wildcards(&mut table);
    table.insert(
        GLOBAL_CATEGORY,
        WILDCARD,
        WeaponPolicy {
            enabled: true,
            notify_console: true,
            notify_broadcast: true,
            notify_external: true,
            ..WeaponPolicy::default()
        },
    );
    let registry = WeaponRegistry::with_seed(table, ItemCatalog::default(), false, 5);
    let engine = RaidEngine::new(
        registry,
        OwnershipFilter::new(SuppressionRules::default(), ignores),
        ExplosiveTracker::new(Vec::new()),
        RaidEventStore::default(),
        true,
    );
    let world = Arc::new(world);
    AppState {
        config: RuntimeConfig::default(),
        engine: Arc::new(Mutex::new(engine)),
        event_repo: events,
        policy_repo: Arc::new(MemoryPolicies::default()),
        world: world.clone(),
        relations: world.clone(),
        territories: Vec::new(),
        world_sync: world,
        delivery,
        broadcast_hub: Arc::new(BroadcastHub::default()),
        metrics: Arc::new(Metrics::default()),
        last_queries: Arc::new(RwLock::new(HashMap::new())),
    }
}
