// Item catalog entity

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::BuildingTier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Raw spawned/prefab short names that stand for this item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Display names and prefab-to-item aliases.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    entries: Vec<CatalogEntry>,
    display_names: HashMap<String, String>,
    aliases: HashMap<String, String>,
}

impl ItemCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut display_names = HashMap::new();
        let mut aliases = HashMap::new();
        for entry in &entries {
            if let Some(name) = &entry.display_name {
                display_names.insert(entry.identifier.clone(), name.clone());
            }
            for alias in &entry.aliases {
                aliases
                    .entry(alias.clone())
                    .or_insert_with(|| entry.identifier.clone());
            }
        }
        Self {
            entries,
            display_names,
            aliases,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Item identifier a raw prefab short name stands for, or the raw name itself.
    pub fn item_for(&self, raw: &str) -> String {
        self.aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Human-readable name; tier-qualified structures read "<Tier> <name>".
    pub fn pretty_name(&self, identifier: &str) -> String {
        if let Some(name) = self.display_names.get(identifier) {
            return name.clone();
        }
        if let Some((base, suffix)) = identifier.rsplit_once('.') {
            if let Some(tier) = BuildingTier::from_suffix(suffix) {
                let base_name = self
                    .display_names
                    .get(base)
                    .cloned()
                    .unwrap_or_else(|| base.to_string());
                return format!("{} {}", tier.display_name(), base_name);
            }
        }
        identifier.to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogPayload {
    pub items: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogUpdateQuery {
    pub mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(vec![
            CatalogEntry {
                identifier: "explosive.timed".to_string(),
                display_name: Some("Timed Explosive Charge".to_string()),
                aliases: vec!["explosive.timed.deployed".to_string()],
            },
            CatalogEntry {
                identifier: "wall".to_string(),
                display_name: Some("Wall".to_string()),
                aliases: Vec::new(),
            },
        ])
    }

    #[test]
    fn aliases_map_prefabs_to_items() {
        let catalog = catalog();
        assert_eq!(catalog.item_for("explosive.timed.deployed"), "explosive.timed");
        assert_eq!(catalog.item_for("rocket_basic"), "rocket_basic");
    }

    #[test]
    fn pretty_names_cover_tiers_and_fallbacks() {
        let catalog = catalog();
        assert_eq!(catalog.pretty_name("explosive.timed"), "Timed Explosive Charge");
        assert_eq!(catalog.pretty_name("wall.toptier"), "HQM Wall");
        assert_eq!(catalog.pretty_name("door.hinged"), "door.hinged");
    }
}
