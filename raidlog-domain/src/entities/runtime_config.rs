// Runtime configuration carried by the application state

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entities::SuppressionRules;
use crate::value_objects::{BuildingTier, EventOutcome};

/// Placeholder webhook address shipped in sample configs; treated as "not configured".
pub const WEBHOOK_PLACEHOLDER_MARKER: &str = "Intro-to-Webhooks";

pub const DEFAULT_CONSOLE_TEMPLATE: &str = "(RE: {raidEventIndex}) {attackerName}[{attackerSteamID}] is raiding {victimName}[{victimSteamID}] ~ {weaponName} -> {raidEventType} {entityShortname} @ {gridPos} (teleportpos {teleportPos})";
pub const DEFAULT_BROADCAST_TEMPLATE: &str = "{attackerName}[{attackerSteamID}] is raiding {victimName}[{victimSteamID}] ~ {weaponName} {raidEventType} {entityItemName} ({entityShortname}) @ {gridPos}";
pub const DEFAULT_SIMPLE_TEMPLATE: &str = "{attackerName}[{attackerSteamID}] is raiding {victimName}[{victimSteamID}] ~ {weaponName} -> {raidEventType} {entityItemName} ({entityShortname}) @ {gridPos} (teleportpos {teleportPos})";

pub fn default_excluded_explosives() -> Vec<String> {
    [
        "firecrackers.deployed",
        "flare.deployed",
        "maincannonshell",
        "rocket_heli",
        "rocket_heli_napalm",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

pub fn default_outcome_labels() -> BTreeMap<String, String> {
    EventOutcome::all()
        .iter()
        .map(|outcome| (outcome.as_str().to_string(), outcome.default_label().to_string()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookMode {
    Simple,
    #[default]
    Embed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedTemplate {
    pub title: String,
    pub thumbnail_url: String,
    pub fields: Vec<EmbedField>,
}

impl Default for EmbedTemplate {
    fn default() -> Self {
        Self {
            title: "{attackerName} is raiding {victimName} @ {gridPos}".to_string(),
            thumbnail_url: String::new(),
            fields: vec![
                EmbedField {
                    name: "Weapon".to_string(),
                    value: "{weaponName} ({raidTrackerCategory} / {weaponShortname})".to_string(),
                    inline: false,
                },
                EmbedField {
                    name: "Entity".to_string(),
                    value: "{raidEventType} {entityItemName} ({entityShortname})".to_string(),
                    inline: false,
                },
                EmbedField {
                    name: "Attacker".to_string(),
                    value: "{attackerName} ({attackerSteamID})\n{attackerTeamName}".to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Victim".to_string(),
                    value: "{victimName} ({victimSteamID})\n{victimTeamName}".to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Location".to_string(),
                    value: "{gridPos} - teleportpos {teleportPos}".to_string(),
                    inline: false,
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub mode: WebhookMode,
    pub simple_template: String,
    pub embed: EmbedTemplate,
}

impl WebhookSettings {
    pub fn enabled(&self) -> bool {
        self.active_url().is_some()
    }

    pub fn active_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !url.contains(WEBHOOK_PLACEHOLDER_MARKER))
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub admin_token: Option<String>,
    pub event_log_path: String,
    pub policy_table_path: String,
    pub ignore_table_path: String,
    pub item_catalog_path: String,
    pub archive_dir: String,
    pub retention_days: f64,
    pub wipe_on_new_world: bool,
    pub search_radius: f32,
    pub world_size: f32,
    pub ignore_same_owner: bool,
    pub ignore_team_member: bool,
    pub ignore_clan_member_or_ally: bool,
    pub ignored_tiers: Vec<BuildingTier>,
    pub enable_new_trackers: bool,
    pub excluded_explosives: Vec<String>,
    pub outcome_labels: BTreeMap<String, String>,
    pub console_template: String,
    pub broadcast_template: String,
    pub webhook: WebhookSettings,
    pub delivery_cooldown_seconds: u64,
    pub delivery_success_delay_seconds: u64,
    pub max_rate_limit_retries: u32,
    pub delivery_history: usize,
    pub housekeeping_interval_minutes: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            admin_token: None,
            event_log_path: "./data/raid_events.json".to_string(),
            policy_table_path: "./data/weapon_policies.yaml".to_string(),
            ignore_table_path: "./data/ownership_ignore.yaml".to_string(),
            item_catalog_path: "./data/item_catalog.json".to_string(),
            archive_dir: "./data/archive".to_string(),
            retention_days: 7.0,
            wipe_on_new_world: true,
            search_radius: 50.0,
            world_size: 4000.0,
            ignore_same_owner: true,
            ignore_team_member: true,
            ignore_clan_member_or_ally: true,
            ignored_tiers: vec![BuildingTier::Twigs],
            enable_new_trackers: true,
            excluded_explosives: default_excluded_explosives(),
            outcome_labels: default_outcome_labels(),
            console_template: DEFAULT_CONSOLE_TEMPLATE.to_string(),
            broadcast_template: DEFAULT_BROADCAST_TEMPLATE.to_string(),
            webhook: WebhookSettings {
                url: None,
                mode: WebhookMode::Embed,
                simple_template: DEFAULT_SIMPLE_TEMPLATE.to_string(),
                embed: EmbedTemplate::default(),
            },
            delivery_cooldown_seconds: 200,
            delivery_success_delay_seconds: 2,
            max_rate_limit_retries: 5,
            delivery_history: 50,
            housekeeping_interval_minutes: 10,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl RuntimeConfig {
    pub fn suppression_rules(&self) -> SuppressionRules {
        SuppressionRules {
            ignore_same_owner: self.ignore_same_owner,
            ignore_team_member: self.ignore_team_member,
            ignore_clan_member_or_ally: self.ignore_clan_member_or_ally,
            ignored_tiers: self.ignored_tiers.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    pub fn outcome_label(&self, outcome: EventOutcome) -> String {
        self.outcome_labels
            .get(outcome.as_str())
            .cloned()
            .unwrap_or_else(|| outcome.default_label().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels_fall_back_to_defaults() {
        let mut config = RuntimeConfig::default();
        config.outcome_labels.remove("burned");
        config
            .outcome_labels
            .insert("hit".to_string(), "struck".to_string());
        assert_eq!(config.outcome_label(EventOutcome::Burned), "burnt");
        assert_eq!(config.outcome_label(EventOutcome::Hit), "struck");
    }

    #[test]
    fn placeholder_webhook_counts_as_disabled() {
        let mut settings = WebhookSettings {
            url: Some(
                "https://support.discord.com/hc/en-us/articles/228383668-Intro-to-Webhooks"
                    .to_string(),
            ),
            mode: WebhookMode::Embed,
            simple_template: String::new(),
            embed: EmbedTemplate::default(),
        };
        assert!(!settings.enabled());
        settings.url = Some("  ".to_string());
        assert!(!settings.enabled());
        settings.url = Some("https://hooks.example/abc".to_string());
        assert_eq!(settings.active_url(), Some("https://hooks.example/abc"));
    }
}
