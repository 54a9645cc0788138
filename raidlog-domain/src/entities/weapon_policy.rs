// Weapon policy entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::{GLOBAL_CATEGORY, WILDCARD};

/// Embed color used when a policy color does not parse.
pub const FALLBACK_COLOR: &str = "#54A8FC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponPolicy {
    pub enabled: bool,
    pub name: String,
    pub color: String,
    pub always_log: bool,
    pub short_arrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_icon: Option<String>,
    pub notify_console: bool,
    pub notify_broadcast: bool,
    pub notify_external: bool,
}

impl Default for WeaponPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            name: String::new(),
            color: FALLBACK_COLOR.to_string(),
            always_log: false,
            short_arrow: false,
            external_icon: None,
            notify_console: false,
            notify_broadcast: false,
            notify_external: false,
        }
    }
}

impl WeaponPolicy {
    /// Color as a 24-bit integer, for payloads that want a decimal color.
    pub fn color_value(&self) -> u32 {
        parse_hex_color(&self.color)
            .or_else(|| parse_hex_color(FALLBACK_COLOR))
            .unwrap_or_default()
    }

    pub fn notifies_anywhere(&self) -> bool {
        self.notify_console || self.notify_broadcast || self.notify_external
    }
}

pub fn parse_hex_color(value: &str) -> Option<u32> {
    let trimmed = value.trim().trim_start_matches('#');
    if trimmed.len() != 6 {
        return None;
    }
    u32::from_str_radix(trimmed, 16).ok()
}

/// Category → identifier → policy. Kept sorted so the persisted file diffs cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    categories: BTreeMap<String, BTreeMap<String, WeaponPolicy>>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self, category: &str) -> Option<&BTreeMap<String, WeaponPolicy>> {
        self.categories.get(category)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn get(&self, category: &str, identifier: &str) -> Option<&WeaponPolicy> {
        self.categories.get(category)?.get(identifier)
    }

    pub fn global_wildcard(&self) -> Option<&WeaponPolicy> {
        self.get(GLOBAL_CATEGORY, WILDCARD)
    }

    pub fn ensure_category(&mut self, category: &str) -> &mut BTreeMap<String, WeaponPolicy> {
        self.categories.entry(category.to_string()).or_default()
    }

    pub fn insert(&mut self, category: &str, identifier: &str, policy: WeaponPolicy) {
        self.ensure_category(category)
            .insert(identifier.to_string(), policy);
    }

    pub fn categories(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, WeaponPolicy>)> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Operator-facing view of one table entry and what it currently resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyListing {
    pub category: String,
    pub identifier: String,
    pub configured: WeaponPolicy,
    pub effective: WeaponPolicy,
}

#[derive(Debug, Deserialize)]
pub struct PolicyListQuery {
    pub category: Option<String>,
    pub query: Option<String>,
}
