use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::info;

use crate::entities::{ItemCatalog, PolicyListing, PolicyTable, WeaponDescriptor, WeaponPolicy};
use crate::error::RaidError;
use crate::utils::random_color_hex;
use crate::value_objects::{GLOBAL_CATEGORY, WILDCARD};

/// Resolves (category, identifier) pairs to policies and registers identifiers on first sight.
///
/// Precedence is exact entry, then category wildcard, then global wildcard. A disabled exact
/// entry is switched on by an enabled wildcard, which also lends its notification flags; an
/// enabled exact entry is returned as configured.
pub struct WeaponRegistry {
    table: PolicyTable,
    catalog: ItemCatalog,
    enable_new: bool,
    rng: SmallRng,
    dirty: bool,
}

impl WeaponRegistry {
    pub fn new(table: PolicyTable, catalog: ItemCatalog, enable_new: bool) -> Self {
        Self::with_rng(table, catalog, enable_new, SmallRng::from_entropy())
    }

    pub fn with_seed(table: PolicyTable, catalog: ItemCatalog, enable_new: bool, seed: u64) -> Self {
        Self::with_rng(table, catalog, enable_new, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(table: PolicyTable, catalog: ItemCatalog, enable_new: bool, rng: SmallRng) -> Self {
        let mut registry = Self {
            table,
            catalog,
            enable_new,
            rng,
            dirty: false,
        };
        registry.fill_missing_names();
        registry
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn replace_catalog(&mut self, catalog: ItemCatalog) {
        self.catalog = catalog;
        self.fill_missing_names();
    }

    pub fn resolve(&self, category: &str, identifier: &str) -> Result<WeaponPolicy, RaidError> {
        let entries = self
            .table
            .category(category)
            .ok_or_else(|| RaidError::UnknownCategory(category.to_string()))?;

        let wildcard = match self.table.global_wildcard() {
            Some(global) if global.enabled => Some(global),
            global => entries.get(WILDCARD).or(global),
        };

        let Some(exact) = entries.get(identifier) else {
            let mut synthesized = WeaponPolicy {
                name: self.pretty_name(identifier),
                ..WeaponPolicy::default()
            };
            if let Some(wildcard) = wildcard.filter(|policy| policy.enabled) {
                synthesized.enabled = true;
                inherit_notifications(&mut synthesized, wildcard);
            }
            return Ok(synthesized);
        };

        match wildcard {
            Some(wildcard) if !exact.enabled && wildcard.enabled => {
                let mut effective = exact.clone();
                effective.enabled = true;
                inherit_notifications(&mut effective, wildcard);
                Ok(effective)
            }
            _ => Ok(exact.clone()),
        }
    }

    /// Creates a default entry for a never-seen identifier, then resolves it.
    pub fn register_if_absent(
        &mut self,
        category: &str,
        identifier: &str,
    ) -> Result<WeaponPolicy, RaidError> {
        if self.table.get(category, identifier).is_none() {
            let policy = WeaponPolicy {
                enabled: self.enable_new,
                name: self.pretty_name(identifier),
                color: random_color_hex(&mut self.rng),
                ..WeaponPolicy::default()
            };
            info!(
                target: "raidlog::audit",
                "added weapon policy {} ({} / {}), enabled: {}",
                policy.name,
                category,
                identifier,
                policy.enabled
            );
            self.table.insert(category, identifier, policy);
            self.dirty = true;
        }
        self.resolve(category, identifier)
    }

    /// Display name for a descriptor: "primary" or "primary [secondary]".
    pub fn weapon_label(&self, descriptor: &WeaponDescriptor) -> String {
        let name_of = |category: &str, identifier: &str| {
            self.resolve(category, identifier)
                .map(|policy| policy.name)
                .unwrap_or_else(|_| self.pretty_name(identifier))
        };
        let primary = name_of(
            descriptor.primary.category.as_str(),
            &descriptor.primary.identifier,
        );
        match &descriptor.secondary {
            Some(secondary) => format!(
                "{} [{}]",
                primary,
                name_of(secondary.category.as_str(), &secondary.identifier)
            ),
            None => primary,
        }
    }

    pub fn primary_policy(&self, descriptor: &WeaponDescriptor) -> Result<WeaponPolicy, RaidError> {
        self.resolve(
            descriptor.primary.category.as_str(),
            &descriptor.primary.identifier,
        )
    }

    pub fn pretty_name(&self, identifier: &str) -> String {
        self.catalog.pretty_name(&self.catalog.item_for(identifier))
    }

    pub fn listings(&self, category: Option<&str>) -> Vec<PolicyListing> {
        let mut listings = Vec::new();
        for (name, entries) in self.table.categories() {
            if category.map(|wanted| wanted != name.as_str()).unwrap_or(false) {
                continue;
            }
            for (identifier, configured) in entries {
                let effective = self
                    .resolve(name, identifier)
                    .unwrap_or_else(|_| configured.clone());
                listings.push(PolicyListing {
                    category: name.clone(),
                    identifier: identifier.clone(),
                    configured: configured.clone(),
                    effective,
                });
            }
        }
        listings
    }

    /// Snapshot of the table when it changed since the last call.
    pub fn take_dirty(&mut self) -> Option<PolicyTable> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.table.clone())
    }

    fn fill_missing_names(&mut self) {
        let mut missing = Vec::new();
        for (category, entries) in self.table.categories() {
            for (identifier, policy) in entries {
                if policy.name.trim().is_empty() && identifier != WILDCARD {
                    missing.push((category.clone(), identifier.clone()));
                }
            }
        }
        for (category, identifier) in missing {
            let name = self.pretty_name(&identifier);
            if let Some(policy) = self.table.ensure_category(&category).get_mut(&identifier) {
                policy.name = name;
                self.dirty = true;
            }
        }
    }
}

fn inherit_notifications(policy: &mut WeaponPolicy, source: &WeaponPolicy) {
    policy.notify_console = source.notify_console;
    policy.notify_broadcast = source.notify_broadcast;
    policy.notify_external = source.notify_external;
}

/// Category names a table must hold before anything resolves against it.
pub fn ensure_wildcards(table: &mut PolicyTable) {
    let mut categories = vec![GLOBAL_CATEGORY.to_string()];
    categories.extend(
        crate::value_objects::TrackerCategory::all()
            .iter()
            .map(|category| category.as_str().to_string()),
    );
    for category in categories {
        let entries = table.ensure_category(&category);
        entries.entry(WILDCARD.to_string()).or_insert_with(|| WeaponPolicy {
            name: format!("Enable all '{}' trackers", category),
            ..WeaponPolicy::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CatalogEntry, WeaponRef};
    use crate::value_objects::TrackerCategory;

    const COLLISION: &str = "entity_collision";

    fn policy(enabled: bool) -> WeaponPolicy {
        WeaponPolicy {
            enabled,
            name: "C4".to_string(),
            color: "#FF5764".to_string(),
            ..WeaponPolicy::default()
        }
    }

    fn registry_with(table: PolicyTable) -> WeaponRegistry {
        let catalog = ItemCatalog::new(vec![CatalogEntry {
            identifier: "explosive.timed".to_string(),
            display_name: Some("Timed Explosive Charge".to_string()),
            aliases: vec!["explosive.timed.deployed".to_string()],
        }]);
        WeaponRegistry::with_seed(table, catalog, true, 11)
    }

    fn base_table() -> PolicyTable {
        let mut table = PolicyTable::new();
        ensure_wildcards(&mut table);
        table
    }

    #[test]
    fn resolve_unknown_category_fails_loudly() {
        let registry = registry_with(PolicyTable::new());
        let err = registry
            .resolve(COLLISION, "rocket_basic")
            .expect_err("unknown category");
        assert_eq!(err, RaidError::UnknownCategory(COLLISION.to_string()));
    }

    #[test]
    fn enabled_exact_entry_wins_over_wildcards() {
        let mut table = base_table();
        let mut global = policy(true);
        global.notify_external = true;
        table.insert(GLOBAL_CATEGORY, WILDCARD, global);
        table.insert(COLLISION, "explosive.timed.deployed", policy(true));
        let registry = registry_with(table);

        let resolved = registry
            .resolve(COLLISION, "explosive.timed.deployed")
            .expect("resolve");
        assert!(resolved.enabled);
        assert!(!resolved.notify_external);
    }

    #[test]
    fn disabled_exact_entry_is_enabled_by_category_wildcard() {
        let mut table = base_table();
        let mut wildcard = policy(true);
        wildcard.notify_console = true;
        table.insert(COLLISION, WILDCARD, wildcard);
        table.insert(COLLISION, "explosive.timed.deployed", policy(false));
        let registry = registry_with(table);

        let resolved = registry
            .resolve(COLLISION, "explosive.timed.deployed")
            .expect("resolve");
        assert!(resolved.enabled);
        assert!(resolved.notify_console);
        assert_eq!(resolved.name, "C4");
        assert_eq!(resolved.color, "#FF5764");
    }

    #[test]
    fn global_wildcard_takes_precedence_when_enabled() {
        let mut table = base_table();
        let mut global = policy(true);
        global.notify_broadcast = true;
        table.insert(GLOBAL_CATEGORY, WILDCARD, global);
        let mut category = policy(true);
        category.notify_console = true;
        table.insert(COLLISION, WILDCARD, category);
        table.insert(COLLISION, "rocket_basic", policy(false));
        let registry = registry_with(table);

        let resolved = registry.resolve(COLLISION, "rocket_basic").expect("resolve");
        assert!(resolved.notify_broadcast);
        assert!(!resolved.notify_console);
    }

    #[test]
    fn everything_disabled_stays_disabled() {
        let mut table = base_table();
        table.insert(COLLISION, "rocket_basic", policy(false));
        let registry = registry_with(table);
        assert!(!registry.resolve(COLLISION, "rocket_basic").expect("resolve").enabled);
    }

    #[test]
    fn register_if_absent_creates_once_with_pretty_name() {
        let mut registry = registry_with(base_table());
        let created = registry
            .register_if_absent(COLLISION, "explosive.timed.deployed")
            .expect("register");
        assert!(created.enabled);
        assert_eq!(created.name, "Timed Explosive Charge");
        assert!(registry.take_dirty().is_some());

        let mut tweaked = created.clone();
        tweaked.enabled = false;
        tweaked.color = "#000000".to_string();
        let mut table = registry.table().clone();
        table.insert(COLLISION, "explosive.timed.deployed", tweaked);
        let mut registry = registry_with(table);
        let again = registry
            .register_if_absent(COLLISION, "explosive.timed.deployed")
            .expect("register");
        assert!(!again.enabled);
        assert_eq!(again.color, "#000000");
        assert!(registry.take_dirty().is_none());
    }

    #[test]
    fn register_if_absent_creates_missing_category() {
        let mut registry = registry_with(PolicyTable::new());
        let created = registry
            .register_if_absent("entity_death_fire", "fire_damage")
            .expect("register");
        assert!(created.enabled);
        assert!(registry.resolve("entity_death_fire", "fire_damage").is_ok());
    }

    #[test]
    fn unregistered_identifier_in_known_category_resolves() {
        let registry = registry_with(base_table());
        let resolved = registry.resolve(COLLISION, "rocket_hv").expect("resolve");
        assert!(!resolved.enabled);
        assert_eq!(resolved.name, "rocket_hv");
    }

    #[test]
    fn weapon_label_joins_primary_and_secondary_names() {
        let mut table = base_table();
        let mut rifle = policy(true);
        rifle.name = "Assault Rifle".to_string();
        table.insert("entity_death_weapon", "rifle.ak", rifle);
        let mut ammo = policy(true);
        ammo.name = "Exp Rifle Ammo".to_string();
        table.insert("entity_death_ammo", "ammo.rifle.explosive", ammo);
        let registry = registry_with(table);

        let descriptor = WeaponDescriptor::composite(
            WeaponRef::new("rifle.ak", TrackerCategory::EntityDeathWeapon),
            WeaponRef::new("ammo.rifle.explosive", TrackerCategory::EntityDeathAmmo),
        );
        assert_eq!(
            registry.weapon_label(&descriptor),
            "Assault Rifle [Exp Rifle Ammo]"
        );
    }
}
