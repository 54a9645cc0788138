// Delivery entities

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entities::RaidEvent;

/// One pending outbound notification: the event plus everything needed to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryItem {
    pub event: RaidEvent,
    pub placeholders: BTreeMap<String, String>,
    pub color: u32,
    pub icon: Option<String>,
}

impl DeliveryItem {
    pub fn label(&self) -> String {
        format!("{} -> {}", self.event.weapon, self.event.target.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResponse {
    Accepted,
    RateLimited { retry_after: Duration },
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub timestamp_ms: i64,
    pub status: String,
    pub item: String,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryListQuery {
    pub limit: Option<usize>,
}
