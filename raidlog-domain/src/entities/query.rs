// Operator query entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::IndexedEvent;
use crate::value_objects::{PlayerId, Vec3};

pub const DEFAULT_TIME_WINDOW_HOURS: f64 = 24.0;
/// Widest time window an operator can ask for (about a century).
pub const MAX_TIME_WINDOW_HOURS: f64 = 876_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EventFilter {
    All,
    /// Events from the last N hours.
    Time(f64),
    /// Substring of a weapon identifier or display name.
    Weapon(String),
    /// Substring of the target label.
    Entity(String),
    /// Exact attacker team id; `None` groups every team.
    Team(Option<u64>),
    /// Exact attacker id or substring of the attacker name.
    Player(String),
}

impl EventFilter {
    pub fn parse(filter_type: Option<&str>, value: Option<&str>) -> Self {
        let value = value.unwrap_or("").trim().to_lowercase();
        match filter_type.unwrap_or("").trim().to_lowercase().as_str() {
            "time" => EventFilter::Time(
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|hours| hours.is_finite())
                    .map(|hours| hours.clamp(0.0, MAX_TIME_WINDOW_HOURS))
                    .unwrap_or(DEFAULT_TIME_WINDOW_HOURS),
            ),
            "weapon" => EventFilter::Weapon(value),
            "entity" => EventFilter::Entity(value),
            "team" => EventFilter::Team(value.parse().ok()),
            "player" => EventFilter::Player(value),
            _ => EventFilter::All,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            EventFilter::All => "default",
            EventFilter::Time(_) => "time",
            EventFilter::Weapon(_) => "weapon",
            EventFilter::Entity(_) => "entity",
            EventFilter::Team(_) => "team",
            EventFilter::Player(_) => "player",
        }
    }

    pub fn value_label(&self) -> String {
        match self {
            EventFilter::All => String::new(),
            EventFilter::Time(hours) => hours.to_string(),
            EventFilter::Weapon(value) | EventFilter::Entity(value) | EventFilter::Player(value) => {
                value.clone()
            }
            EventFilter::Team(team) => team.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub position: Vec3,
    pub radius: f32,
    pub filter: EventFilter,
}

#[derive(Debug, Deserialize)]
pub struct EventQueryParams {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: Option<f32>,
    pub filter: Option<String>,
    pub value: Option<String>,
    /// Remembers the query under this key for "repeat last".
    pub operator: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LastQueryParams {
    pub operator: String,
}

/// Generation half of an [`EventIndex`](crate::value_objects::EventIndex) on the read path.
#[derive(Debug, Deserialize)]
pub struct EventLookupParams {
    pub generation: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponCount {
    pub name: String,
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventGroup {
    pub key: String,
    pub count: usize,
    pub weapons: Vec<WeaponCount>,
    pub events: Vec<IndexedEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub radius: f32,
    pub total: usize,
    pub filter_type: String,
    pub filter: String,
    pub groups: Vec<EventGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadiusDeletion {
    pub position: Vec3,
    pub radius: Option<f32>,
    pub operator_id: PlayerId,
    #[serde(default)]
    pub operator_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttackerDeletion {
    pub attacker_id: PlayerId,
    #[serde(default)]
    pub operator_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeDeletion {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub operator_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}
