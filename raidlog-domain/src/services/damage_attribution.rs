// Direct-damage attribution
// Melee, gunfire and fire damage reported synchronously by the host, resolved in the same call

use chrono::{DateTime, Utc};

use crate::entities::{
    prefab_shortname, ActorInfo, AttributedEvent, DamageKind, DamageSignal, Initiator, RaidEvent,
    StructureInfo, WeaponDescriptor, WeaponPolicy, WeaponRef,
};
use crate::error::RaidError;
use crate::services::AttributionContext;
use crate::value_objects::{EventOutcome, TrackerCategory, Vec3};

/// Identifier recorded for heat damage that carries no weapon.
pub const FIRE_DAMAGE_IDENTIFIER: &str = "fire_damage";
const BURN_ORIGIN_LIFT: f32 = 0.2;

pub fn attribute_damage(
    signal: &DamageSignal,
    now: DateTime<Utc>,
    ctx: &mut AttributionContext<'_>,
) -> Result<Option<(AttributedEvent, WeaponPolicy)>, RaidError> {
    match &signal.initiator {
        Initiator::Fireball {
            identifier,
            creator,
        } => attribute_fireball(&signal.target, identifier, creator.as_ref(), now, ctx),
        Initiator::Player(attacker) => attribute_player(signal, attacker, now, ctx),
        Initiator::Other => Ok(None),
    }
}

fn attribute_fireball(
    target: &StructureInfo,
    identifier: &str,
    creator: Option<&ActorInfo>,
    now: DateTime<Utc>,
    ctx: &mut AttributionContext<'_>,
) -> Result<Option<(AttributedEvent, WeaponPolicy)>, RaidError> {
    let policy = ctx
        .registry
        .register_if_absent(TrackerCategory::EntityDeathFire.as_str(), identifier)?;
    if !policy.enabled || ctx.suppression(target, None).is_some() {
        return Ok(None);
    }
    let (attacker_id, attacker_name, attacker_team_id) = match creator {
        Some(creator) => (creator.id, creator.name.clone(), ctx.team_of(creator)),
        None => (0, policy.name.clone(), 0),
    };
    let event = burned_event(
        target,
        WeaponRef::new(identifier, TrackerCategory::EntityDeathFire),
        attacker_id,
        attacker_name,
        attacker_team_id,
        now,
    );
    Ok(Some((event, policy)))
}

fn attribute_player(
    signal: &DamageSignal,
    attacker: &ActorInfo,
    now: DateTime<Utc>,
    ctx: &mut AttributionContext<'_>,
) -> Result<Option<(AttributedEvent, WeaponPolicy)>, RaidError> {
    let target = &signal.target;
    if ctx.suppression(target, Some(attacker)).is_some() {
        return Ok(None);
    }

    if signal.majority_damage == DamageKind::Heat && signal.weapon_prefab.is_none() {
        let policy = ctx.registry.register_if_absent(
            TrackerCategory::EntityDeathFire.as_str(),
            FIRE_DAMAGE_IDENTIFIER,
        )?;
        if !policy.enabled {
            return Ok(None);
        }
        let event = burned_event(
            target,
            WeaponRef::new(FIRE_DAMAGE_IDENTIFIER, TrackerCategory::EntityDeathFire),
            attacker.id,
            attacker.name.clone(),
            ctx.team_of(attacker),
            now,
        );
        return Ok(Some((event, policy)));
    }

    let Some(descriptor) = weapon_descriptor(signal, attacker, ctx)? else {
        return Ok(None);
    };
    let policy = ctx.registry.primary_policy(&descriptor)?;

    let end = signal
        .hit_position
        .filter(|hit| *hit != Vec3::ZERO && *hit != target.position)
        .unwrap_or_else(|| target.center());
    let event = RaidEvent {
        attacker_id: attacker.id,
        attacker_name: attacker.name.clone(),
        attacker_team_id: ctx.team_of(attacker),
        victim_owner_id: target.owner_id,
        weapon: descriptor,
        outcome: EventOutcome::Destroyed,
        target: target.target(),
        origin: attacker.eye_position(),
        target_position: end,
        timestamp: now,
    };
    Ok(Some((
        AttributedEvent {
            event,
            target_class: Some(target.class.clone()),
        },
        policy,
    )))
}

/// Weapon and ammo for a player hit, with the enabled one as primary.
///
/// The ammo actually loaded in the held weapon replaces the reported projectile when the report
/// carries no prefabs at all, or when it names a different projectile.
fn weapon_descriptor(
    signal: &DamageSignal,
    attacker: &ActorInfo,
    ctx: &mut AttributionContext<'_>,
) -> Result<Option<WeaponDescriptor>, RaidError> {
    let held = attacker.held_item.as_ref();
    let weapon = match &signal.weapon_prefab {
        Some(prefab) => Some(prefab_shortname(prefab)),
        None => held
            .filter(|item| item.is_attack_weapon)
            .map(|item| item.identifier.clone()),
    };
    let mut projectile = signal
        .projectile_prefab
        .as_ref()
        .map(|prefab| ctx.registry.catalog().item_for(&prefab_shortname(prefab)));

    if let Some(loaded) = held.and_then(|item| item.loaded_ammo.as_ref()) {
        let nothing_reported = signal.weapon_prefab.is_none() && signal.projectile_prefab.is_none();
        let stale_report = projectile
            .as_ref()
            .map(|reported| reported != loaded)
            .unwrap_or(false);
        if nothing_reported || stale_report {
            projectile = Some(loaded.clone());
        }
    }

    let weapon_item = weapon.map(|weapon| ctx.registry.catalog().item_for(&weapon));
    let projectile = projectile.filter(|ammo| Some(ammo) != weapon_item.as_ref());

    let weapon_enabled = match &weapon_item {
        Some(item) => {
            ctx.registry
                .register_if_absent(TrackerCategory::EntityDeathWeapon.as_str(), item)?
                .enabled
        }
        None => false,
    };
    let projectile_enabled = match &projectile {
        Some(ammo) => {
            ctx.registry
                .register_if_absent(TrackerCategory::EntityDeathAmmo.as_str(), ammo)?
                .enabled
        }
        None => false,
    };
    if !weapon_enabled && !projectile_enabled {
        return Ok(None);
    }

    let weapon_ref = weapon_item.map(|item| WeaponRef::new(item, TrackerCategory::EntityDeathWeapon));
    let ammo_ref = projectile.map(|ammo| WeaponRef::new(ammo, TrackerCategory::EntityDeathAmmo));
    let descriptor = match (weapon_ref, ammo_ref) {
        (Some(weapon), Some(ammo)) if weapon_enabled => {
            Some(WeaponDescriptor::composite(weapon, ammo))
        }
        (Some(weapon), Some(ammo)) => Some(WeaponDescriptor::composite(ammo, weapon)),
        (None, Some(ammo)) => Some(WeaponDescriptor::single(ammo)),
        (Some(weapon), None) => Some(WeaponDescriptor::single(weapon)),
        (None, None) => None,
    };
    Ok(descriptor)
}

fn burned_event(
    target: &StructureInfo,
    weapon: WeaponRef,
    attacker_id: u64,
    attacker_name: String,
    attacker_team_id: u64,
    now: DateTime<Utc>,
) -> AttributedEvent {
    AttributedEvent {
        event: RaidEvent {
            attacker_id,
            attacker_name,
            attacker_team_id,
            victim_owner_id: target.owner_id,
            weapon: WeaponDescriptor::single(weapon),
            outcome: EventOutcome::Burned,
            target: target.target(),
            origin: target.position.lifted(BURN_ORIGIN_LIFT),
            target_position: target.position,
            timestamp: now,
        },
        target_class: Some(target.class.clone()),
    }
}
