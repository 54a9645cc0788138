// Operator event queries
// Radius search, attribute filters and grouping for the operator surface

use chrono::{DateTime, Duration, Utc};

use crate::entities::{
    EventFilter, EventGroup, IndexedEvent, QueryReport, QueryRequest, RaidEvent, WeaponCount,
    MAX_TIME_WINDOW_HOURS,
};
use crate::ports::RelationDirectory;
use crate::services::{RaidEventStore, WeaponRegistry};

pub fn run_query(
    store: &RaidEventStore,
    registry: &WeaponRegistry,
    relations: &dyn RelationDirectory,
    request: &QueryRequest,
    now: DateTime<Utc>,
) -> QueryReport {
    let matched: Vec<IndexedEvent> = store
        .query_by_radius(request.position, request.radius)
        .into_iter()
        .filter(|indexed| matches_filter(&indexed.event, &request.filter, registry, now))
        .collect();

    let mut groups: Vec<EventGroup> = Vec::new();
    for indexed in matched.iter() {
        let key = group_key(&indexed.event, &request.filter, registry, relations);
        let position = match groups.iter().position(|group| group.key == key) {
            Some(position) => position,
            None => {
                groups.push(EventGroup {
                    key,
                    count: 0,
                    weapons: Vec::new(),
                    events: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[position];
        group.count += 1;
        count_weapon(&mut group.weapons, &indexed.event, registry);
        group.events.push(indexed.clone());
    }

    QueryReport {
        radius: request.radius,
        total: matched.len(),
        filter_type: request.filter.type_name().to_string(),
        filter: request.filter.value_label(),
        groups,
    }
}

fn matches_filter(
    event: &RaidEvent,
    filter: &EventFilter,
    registry: &WeaponRegistry,
    now: DateTime<Utc>,
) -> bool {
    match filter {
        EventFilter::All => true,
        EventFilter::Time(hours) => {
            // Deserialized requests bypass `EventFilter::parse`, so clamp again here.
            let hours = if hours.is_finite() {
                hours.clamp(0.0, MAX_TIME_WINDOW_HOURS)
            } else {
                MAX_TIME_WINDOW_HOURS
            };
            let window = Duration::seconds((hours * 3600.0).round() as i64);
            match now.checked_sub_signed(window) {
                Some(cutoff) => event.timestamp >= cutoff,
                None => true,
            }
        }
        EventFilter::Weapon(needle) => {
            event.weapon.to_string().to_lowercase().contains(needle.as_str())
                || registry
                    .weapon_label(&event.weapon)
                    .to_lowercase()
                    .contains(needle.as_str())
        }
        EventFilter::Entity(needle) => event.target.label().to_lowercase().contains(needle.as_str()),
        EventFilter::Team(Some(team_id)) => event.attacker_team_id == *team_id,
        EventFilter::Team(None) => event.attacker_team_id != 0,
        EventFilter::Player(needle) => {
            needle.parse::<u64>().ok() == Some(event.attacker_id)
                || event.attacker_name.to_lowercase().contains(needle.as_str())
        }
    }
}

fn group_key(
    event: &RaidEvent,
    filter: &EventFilter,
    registry: &WeaponRegistry,
    relations: &dyn RelationDirectory,
) -> String {
    match filter {
        EventFilter::Weapon(_) => registry.weapon_label(&event.weapon),
        EventFilter::Entity(_) => event.target.label(),
        EventFilter::Team(_) => relations
            .team_label(event.attacker_team_id)
            .unwrap_or_else(|| event.attacker_team_id.to_string()),
        EventFilter::All | EventFilter::Time(_) | EventFilter::Player(_) => {
            format!("{}[{}]", event.attacker_name, event.attacker_id)
        }
    }
}

fn count_weapon(counts: &mut Vec<WeaponCount>, event: &RaidEvent, registry: &WeaponRegistry) {
    let name = registry.weapon_label(&event.weapon);
    let category = event.weapon.category().as_str();
    match counts
        .iter_mut()
        .find(|count| count.name == name && count.category == category)
    {
        Some(count) => count.count += 1,
        None => counts.push(WeaponCount {
            name,
            category: category.to_string(),
            count: 1,
        }),
    }
}
