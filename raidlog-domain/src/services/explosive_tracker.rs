use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::entities::{
    ActorInfo, AttributedEvent, DespawnSignal, ExplosiveKind, RaidEvent, SpawnSignal,
    StructureInfo, TargetDescriptor, TickSample, WeaponDescriptor, WeaponPolicy, WeaponRef,
};
use crate::error::RaidError;
use crate::services::{AttributionContext, WeaponRegistry};
use crate::value_objects::{EventOutcome, InstanceId, TrackerCategory, Vec3};

/// Blast radius used when the host does not report one.
pub const DEFAULT_BLAST_RADIUS: f32 = 2.0;
/// How far the resolving sphere is swept along the facing vector.
pub const RESOLVE_CAST_DISTANCE: f32 = 1.0;
/// Distance between a rocket spawn and a launcher for the launcher's operator to be credited.
pub const ARTILLERY_OPERATOR_RANGE: f32 = 25.0;
/// Height added to the origin of artillery events.
pub const ARTILLERY_ORIGIN_LIFT: f32 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Armed,
    Tracking,
    Attached,
    Resolving,
    Resolved,
    Expired,
    Discarded,
}

#[derive(Debug, Clone)]
struct TrackedExplosive {
    identifier: String,
    kind: ExplosiveKind,
    attacker: ActorInfo,
    origin: Vec3,
    position: Vec3,
    facing: Vec3,
    blast_radius: f32,
    started_at: DateTime<Utc>,
    state: LifecycleState,
    target: Option<StructureInfo>,
}

/// What a despawn produced: the terminal state plus the event, if one is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub state: LifecycleState,
    pub event: Option<(AttributedEvent, WeaponPolicy)>,
}

impl Resolution {
    fn silent(state: LifecycleState) -> Self {
        Self { state, event: None }
    }
}

/// Owned table of in-flight explosives keyed by host instance id.
///
/// Instances leave the table as soon as they reach a terminal state, so a terminal instance can
/// never resolve twice; signals for unknown ids are ignored.
pub struct ExplosiveTracker {
    instances: HashMap<InstanceId, TrackedExplosive>,
    artillery_operators: Vec<(Vec3, ActorInfo)>,
    excluded: HashSet<String>,
}

impl ExplosiveTracker {
    pub fn new(excluded: impl IntoIterator<Item = String>) -> Self {
        Self {
            instances: HashMap::new(),
            artillery_operators: Vec::new(),
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn active(&self) -> usize {
        self.instances.len()
    }

    pub fn record_artillery_operator(&mut self, launcher_position: Vec3, operator: ActorInfo) {
        self.artillery_operators
            .retain(|(position, _)| position.distance(launcher_position) >= ARTILLERY_OPERATOR_RANGE);
        self.artillery_operators.push((launcher_position, operator));
    }

    pub fn clear_artillery_operator(&mut self, launcher_position: Vec3) {
        self.artillery_operators
            .retain(|(position, _)| position.distance(launcher_position) >= ARTILLERY_OPERATOR_RANGE);
    }

    fn artillery_operator_near(&self, position: Vec3) -> Option<ActorInfo> {
        self.artillery_operators
            .iter()
            .filter(|(launcher, _)| launcher.distance(position) < ARTILLERY_OPERATOR_RANGE)
            .min_by(|(a, _), (b, _)| {
                a.distance_squared(position)
                    .total_cmp(&b.distance_squared(position))
            })
            .map(|(_, operator)| operator.clone())
    }

    pub fn on_spawn(
        &mut self,
        spawn: &SpawnSignal,
        now: DateTime<Utc>,
        registry: &mut WeaponRegistry,
    ) -> Result<LifecycleState, RaidError> {
        if self.excluded.contains(&spawn.identifier) {
            return Ok(LifecycleState::Expired);
        }
        let policy = registry.register_if_absent(
            TrackerCategory::EntityCollision.as_str(),
            &spawn.identifier,
        )?;
        if !policy.enabled {
            return Ok(LifecycleState::Expired);
        }

        let attacker = match (&spawn.creator, spawn.kind) {
            (Some(creator), _) => Some(creator.clone()),
            (None, ExplosiveKind::ArtilleryRocket) => self.artillery_operator_near(spawn.position),
            (None, _) => None,
        };
        let Some(attacker) = attacker.filter(|actor| !actor.is_npc) else {
            debug!(instance = spawn.instance_id, identifier = %spawn.identifier, "no player attacker");
            return Ok(LifecycleState::Expired);
        };

        debug!(
            instance = spawn.instance_id,
            identifier = %spawn.identifier,
            attacker = attacker.id,
            "explosive armed"
        );
        self.instances.insert(
            spawn.instance_id,
            TrackedExplosive {
                identifier: spawn.identifier.clone(),
                kind: spawn.kind,
                origin: attacker.eye_position(),
                attacker,
                position: spawn.position,
                facing: spawn.facing,
                blast_radius: spawn.blast_radius.unwrap_or(DEFAULT_BLAST_RADIUS),
                started_at: now,
                state: LifecycleState::Armed,
                target: None,
            },
        );
        Ok(LifecycleState::Armed)
    }

    /// Applies one position sample. Returns `None` for ids that are not tracked.
    pub fn on_tick(
        &mut self,
        sample: &TickSample,
        ctx: &mut AttributionContext<'_>,
    ) -> Option<LifecycleState> {
        let instance = self.instances.get_mut(&sample.instance_id)?;
        // A dud never logs, even after it attached.
        if !sample.armed {
            self.instances.remove(&sample.instance_id);
            debug!(instance = sample.instance_id, "explosive disarmed");
            return Some(LifecycleState::Expired);
        }
        if instance.state == LifecycleState::Attached {
            return Some(LifecycleState::Attached);
        }

        if sample.position != instance.position && !sample.position.is_origin_sentinel() {
            instance.position = sample.position;
        }
        if let Some(facing) = sample.facing {
            instance.facing = facing;
        }

        let Some(parent) = &sample.parent else {
            instance.state = LifecycleState::Tracking;
            return Some(LifecycleState::Tracking);
        };
        if ctx.suppression(parent, Some(&instance.attacker)).is_some() {
            self.instances.remove(&sample.instance_id);
            return Some(LifecycleState::Discarded);
        }
        debug!(instance = sample.instance_id, parent = parent.entity_id, "explosive attached");
        instance.state = LifecycleState::Attached;
        instance.target = Some(parent.clone());
        Some(LifecycleState::Attached)
    }

    /// Resolves an instance on despawn. Returns `Ok(None)` for ids that are not tracked.
    pub fn on_despawn(
        &mut self,
        signal: &DespawnSignal,
        ctx: &mut AttributionContext<'_>,
    ) -> Result<Option<Resolution>, RaidError> {
        let Some(mut instance) = self.instances.remove(&signal.instance_id) else {
            return Ok(None);
        };
        if let Some(facing) = signal.facing {
            instance.facing = facing;
        }
        let policy = ctx
            .registry
            .resolve(TrackerCategory::EntityCollision.as_str(), &instance.identifier)?;

        let outcome = if instance.state == LifecycleState::Attached {
            EventOutcome::Attached
        } else {
            instance.state = LifecycleState::Resolving;
            let mut candidates: Vec<StructureInfo> = ctx
                .world
                .sphere_cast(
                    instance.position,
                    instance.facing,
                    instance.blast_radius,
                    RESOLVE_CAST_DISTANCE,
                )
                .into_iter()
                .filter(|candidate| ctx.world.is_visible(instance.position, candidate))
                .collect();
            candidates.sort_by(|a, b| {
                a.center()
                    .distance_squared(instance.position)
                    .total_cmp(&b.center().distance_squared(instance.position))
            });
            match candidates.into_iter().next() {
                Some(nearest) => {
                    if ctx.suppression(&nearest, Some(&instance.attacker)).is_some() {
                        return Ok(Some(Resolution::silent(LifecycleState::Discarded)));
                    }
                    instance.target = Some(nearest);
                    EventOutcome::Hit
                }
                None if policy.always_log => EventOutcome::NoHit,
                None => {
                    debug!(instance = signal.instance_id, "explosive resolved without target");
                    return Ok(Some(Resolution::silent(LifecycleState::Expired)));
                }
            }
        };

        let origin = match instance.kind {
            ExplosiveKind::ArtilleryRocket => instance
                .origin
                .midpoint(instance.position)
                .lifted(ARTILLERY_ORIGIN_LIFT),
            _ => instance.origin,
        };
        let event = RaidEvent {
            attacker_id: instance.attacker.id,
            attacker_name: instance.attacker.name.clone(),
            attacker_team_id: ctx.team_of(&instance.attacker),
            victim_owner_id: instance
                .target
                .as_ref()
                .map(|target| target.owner_id)
                .unwrap_or_default(),
            weapon: WeaponDescriptor::single(WeaponRef::new(
                instance.identifier.clone(),
                TrackerCategory::EntityCollision,
            )),
            outcome,
            target: instance
                .target
                .as_ref()
                .map(StructureInfo::target)
                .unwrap_or_else(TargetDescriptor::unknown),
            origin,
            target_position: instance.position,
            timestamp: instance.started_at,
        };
        debug!(
            instance = signal.instance_id,
            outcome = outcome.as_str(),
            target = %event.target.label(),
            "explosive resolved"
        );
        let attributed = AttributedEvent {
            event,
            target_class: instance.target.map(|target| target.class),
        };
        Ok(Some(Resolution {
            state: LifecycleState::Resolved,
            event: Some((attributed, policy)),
        }))
    }

    /// Drops every in-flight instance; used at shutdown and world reset.
    pub fn expire_all(&mut self) -> usize {
        let expired = self.instances.len();
        self.instances.clear();
        self.artillery_operators.clear();
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{
        actor, filter, registry, structure, FakeRelations, FakeWorld,
    };
    use crate::services::{Collaborators, OwnershipFilter};

    const CHARGE: &str = "explosive.timed.deployed";

    struct Harness {
        tracker: ExplosiveTracker,
        registry: WeaponRegistry,
        filter: OwnershipFilter,
        world: FakeWorld,
        relations: FakeRelations,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                tracker: ExplosiveTracker::new(vec!["flare.deployed".to_string()]),
                registry: registry(true),
                filter: filter(),
                world: FakeWorld::default(),
                relations: FakeRelations::default(),
            }
        }

        fn spawn(&mut self, instance_id: InstanceId, position: Vec3) -> LifecycleState {
            let signal = SpawnSignal {
                instance_id,
                identifier: CHARGE.to_string(),
                kind: ExplosiveKind::Timed,
                creator: Some(actor(10, "raider")),
                position,
                facing: Vec3::new(1.0, 0.0, 0.0),
                blast_radius: Some(4.0),
            };
            self.tracker
                .on_spawn(&signal, Utc::now(), &mut self.registry)
                .expect("spawn")
        }

        fn tick(&mut self, sample: TickSample) -> Option<LifecycleState> {
            let collaborators = Collaborators {
                world: &self.world,
                relations: &self.relations,
                territories: &[],
            };
            let mut ctx =
                AttributionContext::new(&mut self.registry, &mut self.filter, collaborators);
            self.tracker.on_tick(&sample, &mut ctx)
        }

        fn despawn(&mut self, instance_id: InstanceId) -> Option<Resolution> {
            let collaborators = Collaborators {
                world: &self.world,
                relations: &self.relations,
                territories: &[],
            };
            let mut ctx =
                AttributionContext::new(&mut self.registry, &mut self.filter, collaborators);
            self.tracker
                .on_despawn(
                    &DespawnSignal {
                        instance_id,
                        facing: None,
                    },
                    &mut ctx,
                )
                .expect("resolve")
        }
    }

    fn sample(instance_id: InstanceId, position: Vec3) -> TickSample {
        TickSample {
            instance_id,
            position,
            facing: None,
            parent: None,
            armed: true,
        }
    }

    #[test]
    fn nearest_visible_structure_is_the_target() {
        let mut harness = Harness::new();
        let charge_at = Vec3::new(100.0, 0.0, 100.0);
        harness.world.structures = vec![
            structure(2, 30, charge_at.add(Vec3::new(6.0, 0.0, 0.0))),
            structure(1, 20, charge_at.add(Vec3::new(3.0, 0.0, 0.0))),
        ];
        assert_eq!(harness.spawn(5, charge_at), LifecycleState::Armed);
        assert_eq!(harness.tick(sample(5, charge_at)), Some(LifecycleState::Tracking));

        let resolution = harness.despawn(5).expect("tracked");
        assert_eq!(resolution.state, LifecycleState::Resolved);
        let (attributed, policy) = resolution.event.expect("event");
        assert!(policy.enabled);
        assert_eq!(attributed.event.victim_owner_id, 20);
        assert_eq!(attributed.event.outcome, EventOutcome::Hit);
        assert_eq!(attributed.event.attacker_id, 10);
        assert_eq!(attributed.event.target_position, charge_at);
        assert_eq!(harness.tracker.active(), 0);
    }

    #[test]
    fn obstructed_candidates_are_skipped() {
        let mut harness = Harness::new();
        let charge_at = Vec3::new(100.0, 0.0, 100.0);
        harness.world.structures = vec![
            structure(1, 20, charge_at.add(Vec3::new(1.0, 0.0, 0.0))),
            structure(2, 30, charge_at.add(Vec3::new(4.0, 0.0, 0.0))),
        ];
        harness.world.obstructed.insert(1);
        harness.spawn(5, charge_at);
        let (attributed, _) = harness.despawn(5).and_then(|r| r.event).expect("event");
        assert_eq!(attributed.event.victim_owner_id, 30);
    }

    #[test]
    fn attach_wins_and_resolves_once() {
        let mut harness = Harness::new();
        let charge_at = Vec3::new(100.0, 0.0, 100.0);
        let door = structure(9, 20, charge_at);
        harness.spawn(5, charge_at);

        let mut attach = sample(5, charge_at);
        attach.parent = Some(door.clone());
        assert_eq!(harness.tick(attach.clone()), Some(LifecycleState::Attached));
        attach.parent = Some(structure(10, 99, charge_at));
        assert_eq!(harness.tick(attach), Some(LifecycleState::Attached));

        let (attributed, _) = harness.despawn(5).and_then(|r| r.event).expect("event");
        assert_eq!(attributed.event.outcome, EventOutcome::Attached);
        assert_eq!(attributed.event.victim_owner_id, 20);
        assert_eq!(attributed.target_class, Some(door.class));

        assert!(harness.despawn(5).is_none());
        assert!(harness.tick(sample(5, charge_at)).is_none());
    }

    #[test]
    fn suppressed_attach_discards_instance() {
        let mut harness = Harness::new();
        let charge_at = Vec3::new(100.0, 0.0, 100.0);
        harness.spawn(5, charge_at);
        let mut attach = sample(5, charge_at);
        attach.parent = Some(structure(9, 10, charge_at));
        assert_eq!(harness.tick(attach), Some(LifecycleState::Discarded));
        assert!(harness.despawn(5).is_none());
    }

    #[test]
    fn sentinel_and_unchanged_samples_are_ignored() {
        let mut harness = Harness::new();
        let charge_at = Vec3::new(100.0, 0.0, 100.0);
        harness.world.structures = vec![structure(1, 20, charge_at.add(Vec3::new(2.0, 0.0, 0.0)))];
        harness.spawn(5, charge_at);
        harness.tick(sample(5, Vec3::new(0.5, 0.0, 0.5)));
        let (attributed, _) = harness.despawn(5).and_then(|r| r.event).expect("event");
        assert_eq!(attributed.event.target_position, charge_at);
    }

    #[test]
    fn dud_expires_without_event() {
        let mut harness = Harness::new();
        harness.spawn(5, Vec3::new(100.0, 0.0, 100.0));
        let mut dud = sample(5, Vec3::new(100.0, 0.0, 100.0));
        dud.armed = false;
        assert_eq!(harness.tick(dud), Some(LifecycleState::Expired));
        assert!(harness.despawn(5).is_none());
    }

    #[test]
    fn attached_charge_that_goes_dud_expires() {
        let mut harness = Harness::new();
        let charge_at = Vec3::new(100.0, 0.0, 100.0);
        harness.spawn(5, charge_at);
        let mut attach = sample(5, charge_at);
        attach.parent = Some(structure(9, 20, charge_at));
        assert_eq!(harness.tick(attach.clone()), Some(LifecycleState::Attached));

        attach.armed = false;
        assert_eq!(harness.tick(attach), Some(LifecycleState::Expired));
        assert_eq!(harness.tracker.active(), 0);
        assert!(harness.despawn(5).is_none());
    }

    #[test]
    fn no_candidates_expire_unless_always_logged() {
        let mut harness = Harness::new();
        harness.spawn(5, Vec3::new(100.0, 0.0, 100.0));
        let resolution = harness.despawn(5).expect("tracked");
        assert_eq!(resolution.state, LifecycleState::Expired);
        assert!(resolution.event.is_none());

        let mut policy = harness
            .registry
            .resolve("entity_collision", CHARGE)
            .expect("registered");
        policy.always_log = true;
        let mut table = harness.registry.table().clone();
        table.insert("entity_collision", CHARGE, policy);
        harness.registry = WeaponRegistry::with_seed(
            table,
            crate::services::test_support::catalog(),
            true,
            1,
        );
        harness.spawn(6, Vec3::new(100.0, 0.0, 100.0));
        let (attributed, _) = harness.despawn(6).and_then(|r| r.event).expect("event");
        assert_eq!(attributed.event.outcome, EventOutcome::NoHit);
        assert_eq!(attributed.event.target, TargetDescriptor::unknown());
        assert_eq!(attributed.event.victim_owner_id, 0);
    }

    #[test]
    fn excluded_disabled_and_npc_spawns_are_not_tracked() {
        let mut harness = Harness::new();
        let mut signal = SpawnSignal {
            instance_id: 1,
            identifier: "flare.deployed".to_string(),
            kind: ExplosiveKind::Thrown,
            creator: Some(actor(10, "raider")),
            position: Vec3::new(10.0, 0.0, 10.0),
            facing: Vec3::ZERO,
            blast_radius: None,
        };
        assert_eq!(
            harness.tracker.on_spawn(&signal, Utc::now(), &mut harness.registry),
            Ok(LifecycleState::Expired)
        );

        signal.identifier = "grenade.f1.deployed".to_string();
        let mut npc = actor(11, "scientist");
        npc.is_npc = true;
        signal.creator = Some(npc);
        assert_eq!(
            harness.tracker.on_spawn(&signal, Utc::now(), &mut harness.registry),
            Ok(LifecycleState::Expired)
        );

        let mut disabled = Harness::new();
        disabled.registry = registry(false);
        signal.creator = Some(actor(10, "raider"));
        assert_eq!(
            disabled.tracker.on_spawn(&signal, Utc::now(), &mut disabled.registry),
            Ok(LifecycleState::Expired)
        );
        assert_eq!(disabled.tracker.active(), 0);
    }

    #[test]
    fn artillery_rocket_credits_nearby_operator() {
        let mut harness = Harness::new();
        let launcher = Vec3::new(200.0, 5.0, 200.0);
        harness.tracker.record_artillery_operator(launcher, actor(42, "gunner"));
        let target_at = Vec3::new(600.0, 0.0, 600.0);
        harness.world.structures = vec![structure(1, 20, target_at)];

        let signal = SpawnSignal {
            instance_id: 3,
            identifier: "rocket_mlrs".to_string(),
            kind: ExplosiveKind::ArtilleryRocket,
            creator: None,
            position: launcher.add(Vec3::new(3.0, 2.0, 0.0)),
            facing: Vec3::ZERO,
            blast_radius: Some(3.0),
        };
        assert_eq!(
            harness.tracker.on_spawn(&signal, Utc::now(), &mut harness.registry),
            Ok(LifecycleState::Armed)
        );
        harness.tick(sample(3, target_at));
        let (attributed, _) = harness.despawn(3).and_then(|r| r.event).expect("event");
        assert_eq!(attributed.event.attacker_id, 42);
        assert!(attributed.event.origin.y > ARTILLERY_ORIGIN_LIFT);

        harness.tracker.clear_artillery_operator(launcher);
        let mut again = signal.clone();
        again.instance_id = 4;
        assert_eq!(
            harness.tracker.on_spawn(&again, Utc::now(), &mut harness.registry),
            Ok(LifecycleState::Expired)
        );
    }
}
