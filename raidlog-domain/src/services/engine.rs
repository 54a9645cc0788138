use chrono::{DateTime, Utc};
use tracing::info;

use crate::entities::{
    ActorInfo, AttributedEvent, CatalogEntry, DamageSignal, DespawnSignal, ItemCatalog,
    OwnershipIgnoreTable, PolicyTable, QueryReport, QueryRequest, RaidEvent, SpawnSignal,
    TickSample, WeaponPolicy,
};
use crate::error::RaidError;
use crate::ports::RelationDirectory;
use crate::services::{
    attribute_damage, run_query, AttributionContext, Collaborators, ExplosiveTracker,
    LifecycleState, OwnershipFilter, RaidEventStore, WeaponRegistry,
};
use crate::utils::retention_cutoff;
use crate::value_objects::{EventIndex, Vec3};

/// An event that made it into the store, with what notification fan-out needs.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub index: EventIndex,
    pub event: RaidEvent,
    pub policy: WeaponPolicy,
    pub weapon_label: String,
    pub skip_external: bool,
}

/// The attribution engine: registry, filter, tracker and store behind one owner.
pub struct RaidEngine {
    registry: WeaponRegistry,
    filter: OwnershipFilter,
    tracker: ExplosiveTracker,
    store: RaidEventStore,
    wipe_on_new_world: bool,
}

impl RaidEngine {
    pub fn new(
        registry: WeaponRegistry,
        filter: OwnershipFilter,
        tracker: ExplosiveTracker,
        store: RaidEventStore,
        wipe_on_new_world: bool,
    ) -> Self {
        Self {
            registry,
            filter,
            tracker,
            store,
            wipe_on_new_world,
        }
    }

    pub fn registry(&self) -> &WeaponRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &OwnershipFilter {
        &self.filter
    }

    pub fn tracker(&self) -> &ExplosiveTracker {
        &self.tracker
    }

    pub fn store(&self) -> &RaidEventStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RaidEventStore {
        &mut self.store
    }

    pub fn on_spawn(
        &mut self,
        spawn: &SpawnSignal,
        now: DateTime<Utc>,
    ) -> Result<LifecycleState, RaidError> {
        self.tracker.on_spawn(spawn, now, &mut self.registry)
    }

    pub fn on_tick(
        &mut self,
        sample: &TickSample,
        collaborators: Collaborators<'_>,
    ) -> Option<LifecycleState> {
        let mut ctx =
            AttributionContext::new(&mut self.registry, &mut self.filter, collaborators);
        self.tracker.on_tick(sample, &mut ctx)
    }

    pub fn on_despawn(
        &mut self,
        signal: &DespawnSignal,
        collaborators: Collaborators<'_>,
    ) -> Result<Option<RecordedEvent>, RaidError> {
        let mut ctx =
            AttributionContext::new(&mut self.registry, &mut self.filter, collaborators);
        let resolution = self.tracker.on_despawn(signal, &mut ctx)?;
        Ok(resolution
            .and_then(|resolution| resolution.event)
            .map(|(attributed, policy)| self.record(attributed, policy)))
    }

    pub fn on_damage(
        &mut self,
        signal: &DamageSignal,
        now: DateTime<Utc>,
        collaborators: Collaborators<'_>,
    ) -> Result<Option<RecordedEvent>, RaidError> {
        let mut ctx =
            AttributionContext::new(&mut self.registry, &mut self.filter, collaborators);
        let attributed = attribute_damage(signal, now, &mut ctx)?;
        Ok(attributed.map(|(attributed, policy)| self.record(attributed, policy)))
    }

    pub fn on_artillery_fired(&mut self, launcher_position: Vec3, operator: ActorInfo) {
        self.tracker
            .record_artillery_operator(launcher_position, operator);
    }

    pub fn on_artillery_ended(&mut self, launcher_position: Vec3) {
        self.tracker.clear_artillery_operator(launcher_position);
    }

    /// New world detected: drop in-flight explosives and wipe the log when configured to.
    pub fn on_world_reset(&mut self) -> usize {
        self.tracker.expire_all();
        if !self.wipe_on_new_world {
            return 0;
        }
        let removed = self.store.wipe_all();
        info!(target: "raidlog::audit", "new world detected, wiped {} raid events", removed);
        removed
    }

    pub fn expire_in_flight(&mut self) -> usize {
        self.tracker.expire_all()
    }

    pub fn prune_expired(&mut self, now: DateTime<Utc>, retention_days: f64) -> usize {
        let removed = self
            .store
            .prune_older_than(retention_cutoff(now, retention_days));
        if removed > 0 {
            info!(
                target: "raidlog::audit",
                "pruned {} raid events older than {} days",
                removed,
                retention_days
            );
        }
        removed
    }

    pub fn query(
        &self,
        request: &QueryRequest,
        relations: &dyn RelationDirectory,
        now: DateTime<Utc>,
    ) -> QueryReport {
        run_query(&self.store, &self.registry, relations, request, now)
    }

    pub fn weapon_label(&self, event: &RaidEvent) -> String {
        self.registry.weapon_label(&event.weapon)
    }

    pub fn replace_catalog(&mut self, entries: Vec<CatalogEntry>) {
        self.registry.replace_catalog(ItemCatalog::new(entries));
    }

    pub fn catalog(&self) -> &ItemCatalog {
        self.registry.catalog()
    }

    pub fn take_dirty_policies(&mut self) -> Option<PolicyTable> {
        self.registry.take_dirty()
    }

    pub fn take_dirty_ignores(&mut self) -> Option<OwnershipIgnoreTable> {
        self.filter.take_dirty()
    }

    fn record(&mut self, attributed: AttributedEvent, policy: WeaponPolicy) -> RecordedEvent {
        let AttributedEvent {
            event,
            target_class,
        } = attributed;
        let skip_external = target_class
            .as_deref()
            .map(|class| self.filter.skips_external(class))
            .unwrap_or(false);
        let weapon_label = self.registry.weapon_label(&event.weapon);
        let index = self.store.append(event.clone());
        RecordedEvent {
            index,
            event,
            policy,
            weapon_label,
            skip_external,
        }
    }
}
