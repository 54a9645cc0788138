// Notification fan-out
// Console lines, broadcast text and outbound delivery for freshly recorded events

use std::collections::BTreeMap;

use raidlog_domain::ports::RelationDirectory;
use raidlog_domain::services::{RaidEngine, RecordedEvent};
use raidlog_domain::utils::{current_millis, render_template};
use raidlog_domain::value_objects::grid_label;
use raidlog_domain::{DeliveryItem, PlayerId, RuntimeConfig};
use tracing::{debug, info};

use crate::ops::BroadcastMessage;
use crate::AppState;

const NO_TEAM: &str = "No Team";
const UNKNOWN_PLAYER: &str = "Unknown";

/// Everything one recorded event fans out to, rendered while the engine is locked.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub console: Option<String>,
    pub broadcast: Option<BroadcastMessage>,
    pub delivery: Option<DeliveryItem>,
}

pub fn placeholders(
    engine: &RaidEngine,
    config: &RuntimeConfig,
    relations: &dyn RelationDirectory,
    recorded: &RecordedEvent,
) -> BTreeMap<String, String> {
    let event = &recorded.event;
    let registry = engine.registry();
    let catalog = registry.catalog();
    let entity_shortname = event.target.label();
    let weapon_shortname = event.weapon.primary.identifier.clone();
    let victim_team = relations.team_of(event.victim_owner_id);

    let values = [
        ("raidEventIndex", recorded.index.position.to_string()),
        ("attackerName", event.attacker_name.clone()),
        ("attackerSteamID", event.attacker_id.to_string()),
        ("attackerTeamName", team_name(relations, event.attacker_team_id)),
        ("victimName", player_name(relations, event.victim_owner_id)),
        ("victimSteamID", event.victim_owner_id.to_string()),
        ("victimTeamName", team_name(relations, victim_team)),
        ("weaponName", recorded.weapon_label.clone()),
        ("weaponItemShortname", catalog.item_for(&weapon_shortname)),
        ("weaponShortname", weapon_shortname),
        ("entityItemName", registry.pretty_name(&entity_shortname)),
        ("entityItemShortname", catalog.item_for(&event.target.shortname)),
        ("entityShortname", entity_shortname),
        ("raidTrackerCategory", event.weapon.category().as_str().to_string()),
        ("raidEventType", config.outcome_label(event.outcome)),
        ("gridPos", grid_label(event.target_position, config.world_size)),
        ("teleportPos", event.target_position.coordinate_label()),
    ];
    values
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

pub fn compose(
    engine: &RaidEngine,
    config: &RuntimeConfig,
    relations: &dyn RelationDirectory,
    recorded: &RecordedEvent,
) -> Notification {
    let policy = &recorded.policy;
    if !policy.notifies_anywhere() {
        return Notification {
            console: None,
            broadcast: None,
            delivery: None,
        };
    }
    let values = placeholders(engine, config, relations, recorded);
    let console = policy
        .notify_console
        .then(|| render_template(&config.console_template, &values));
    let broadcast = policy.notify_broadcast.then(|| BroadcastMessage {
        timestamp_ms: current_millis(),
        color: policy.color.clone(),
        text: render_template(&config.broadcast_template, &values),
    });
    let delivery = (policy.notify_external && !recorded.skip_external).then(|| DeliveryItem {
        event: recorded.event.clone(),
        placeholders: values.clone(),
        color: policy.color_value(),
        icon: policy.external_icon.clone(),
    });
    Notification {
        console,
        broadcast,
        delivery,
    }
}

pub fn dispatch(state: &AppState, notifications: Vec<Notification>) {
    for notification in notifications {
        if let Some(line) = notification.console {
            info!(target: "raidlog::console", "{}", line);
        }
        if let Some(message) = notification.broadcast {
            let receivers = state.broadcast_hub.publish(message);
            debug!(receivers, "broadcast raid event");
        }
        if let Some(item) = notification.delivery {
            if state.delivery.enqueue(item) {
                state.metrics.record_delivery_enqueued();
            }
        }
    }
}

fn team_name(relations: &dyn RelationDirectory, team_id: u64) -> String {
    if team_id == 0 {
        return NO_TEAM.to_string();
    }
    relations
        .team_label(team_id)
        .unwrap_or_else(|| NO_TEAM.to_string())
}

fn player_name(relations: &dyn RelationDirectory, player: PlayerId) -> String {
    relations
        .player_name(player)
        .unwrap_or_else(|| UNKNOWN_PLAYER.to_string())
}
