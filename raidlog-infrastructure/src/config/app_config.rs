use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use raidlog_domain::{
    default_excluded_explosives, default_outcome_labels, BuildingTier, EmbedTemplate,
    RuntimeConfig, WebhookMode, WebhookSettings, DEFAULT_BROADCAST_TEMPLATE,
    DEFAULT_CONSOLE_TEMPLATE, DEFAULT_SIMPLE_TEMPLATE,
};

use super::validation::{validate_embed_template, validate_positive};

pub const CONFIG_ENV: &str = "RAIDLOG_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub mode: String,
    pub simple_template: String,
    pub embed: EmbedTemplate,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            mode: "embed".to_string(),
            simple_template: DEFAULT_SIMPLE_TEMPLATE.to_string(),
            embed: EmbedTemplate::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub admin_token: Option<String>,
    pub event_log_path: String,
    pub policy_table_path: String,
    pub ignore_table_path: String,
    pub item_catalog_path: String,
    pub archive_dir: String,
    pub audit_log_dir: String,
    pub retention_days: f64,
    pub wipe_on_new_world: bool,
    pub search_radius: f32,
    pub world_size: f32,
    pub ignore_same_owner: bool,
    pub ignore_team_member: bool,
    pub ignore_clan_member_or_ally: bool,
    pub ignored_tiers: Vec<String>,
    pub enable_new_trackers: bool,
    pub excluded_explosives: Vec<String>,
    pub outcome_labels: BTreeMap<String, String>,
    pub console_template: String,
    pub broadcast_template: String,
    pub webhook: WebhookConfig,
    pub delivery_cooldown_seconds: u64,
    pub delivery_success_delay_seconds: u64,
    pub max_rate_limit_retries: u32,
    pub delivery_history: usize,
    pub housekeeping_interval_minutes: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
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
            audit_log_dir: "./logs".to_string(),
            retention_days: 7.0,
            wipe_on_new_world: true,
            search_radius: 50.0,
            world_size: 4000.0,
            ignore_same_owner: true,
            ignore_team_member: true,
            ignore_clan_member_or_ally: true,
            ignored_tiers: vec!["twigs".to_string()],
            enable_new_trackers: true,
            excluded_explosives: default_excluded_explosives(),
            outcome_labels: default_outcome_labels(),
            console_template: DEFAULT_CONSOLE_TEMPLATE.to_string(),
            broadcast_template: DEFAULT_BROADCAST_TEMPLATE.to_string(),
            webhook: WebhookConfig::default(),
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

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        self.api_token = blank_to_none(self.api_token.take());
        self.admin_token = blank_to_none(self.admin_token.take());
        self.webhook.url = blank_to_none(self.webhook.url.take());
        self.webhook.mode = self.webhook.mode.trim().to_lowercase();
        self.ignored_tiers = self
            .ignored_tiers
            .iter()
            .map(|tier| tier.trim().to_lowercase())
            .filter(|tier| !tier.is_empty())
            .collect();
        self.ignored_tiers.sort();
        self.ignored_tiers.dedup();
        self.excluded_explosives = normalize_list(std::mem::take(&mut self.excluded_explosives));
        let defaults = default_outcome_labels();
        for (key, label) in defaults {
            self.outcome_labels.entry(key).or_insert(label);
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.event_log_path = resolve_path(base, &self.event_log_path);
        self.policy_table_path = resolve_path(base, &self.policy_table_path);
        self.ignore_table_path = resolve_path(base, &self.ignore_table_path);
        self.item_catalog_path = resolve_path(base, &self.item_catalog_path);
        self.archive_dir = resolve_path(base, &self.archive_dir);
        self.audit_log_dir = resolve_path(base, &self.audit_log_dir);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        validate_positive("retention_days", self.retention_days)?;
        validate_positive("search_radius", f64::from(self.search_radius))?;
        validate_positive("world_size", f64::from(self.world_size))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.housekeeping_interval_minutes == 0 {
            return Err(anyhow!("housekeeping_interval_minutes must be greater than 0"));
        }
        if self.delivery_history == 0 {
            return Err(anyhow!("delivery_history must be greater than 0"));
        }
        for tier in &self.ignored_tiers {
            if BuildingTier::from_suffix(tier).is_none() {
                return Err(anyhow!("unknown building tier in ignored_tiers: {}", tier));
            }
        }
        self.webhook_mode()?;
        validate_embed_template(&self.webhook.embed)?;
        Ok(())
    }

    fn webhook_mode(&self) -> Result<WebhookMode> {
        match self.webhook.mode.as_str() {
            "simple" => Ok(WebhookMode::Simple),
            "embed" => Ok(WebhookMode::Embed),
            other => Err(anyhow!("unknown webhook mode: {}", other)),
        }
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            admin_token: self.admin_token.clone(),
            event_log_path: self.event_log_path.clone(),
            policy_table_path: self.policy_table_path.clone(),
            ignore_table_path: self.ignore_table_path.clone(),
            item_catalog_path: self.item_catalog_path.clone(),
            archive_dir: self.archive_dir.clone(),
            retention_days: self.retention_days,
            wipe_on_new_world: self.wipe_on_new_world,
            search_radius: self.search_radius,
            world_size: self.world_size,
            ignore_same_owner: self.ignore_same_owner,
            ignore_team_member: self.ignore_team_member,
            ignore_clan_member_or_ally: self.ignore_clan_member_or_ally,
            ignored_tiers: self
                .ignored_tiers
                .iter()
                .filter_map(|tier| BuildingTier::from_suffix(tier))
                .collect(),
            enable_new_trackers: self.enable_new_trackers,
            excluded_explosives: self.excluded_explosives.clone(),
            outcome_labels: self.outcome_labels.clone(),
            console_template: self.console_template.clone(),
            broadcast_template: self.broadcast_template.clone(),
            webhook: WebhookSettings {
                url: self.webhook.url.clone(),
                mode: self.webhook_mode().unwrap_or_default(),
                simple_template: self.webhook.simple_template.clone(),
                embed: self.webhook.embed.clone(),
            },
            delivery_cooldown_seconds: self.delivery_cooldown_seconds,
            delivery_success_delay_seconds: self.delivery_success_delay_seconds,
            max_rate_limit_retries: self.max_rate_limit_retries,
            delivery_history: self.delivery_history,
            housekeeping_interval_minutes: self.housekeeping_interval_minutes,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("RAIDLOG_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("RAIDLOG_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("RAIDLOG_ADMIN_TOKEN") {
            self.admin_token = Some(value);
        }
        if let Ok(value) = env::var("RAIDLOG_EVENT_LOG_PATH") {
            self.event_log_path = value;
        }
        if let Ok(value) = env::var("RAIDLOG_POLICY_TABLE_PATH") {
            self.policy_table_path = value;
        }
        if let Ok(value) = env::var("RAIDLOG_IGNORE_TABLE_PATH") {
            self.ignore_table_path = value;
        }
        if let Ok(value) = env::var("RAIDLOG_ITEM_CATALOG_PATH") {
            self.item_catalog_path = value;
        }
        if let Ok(value) = env::var("RAIDLOG_ARCHIVE_DIR") {
            self.archive_dir = value;
        }
        if let Ok(value) = env::var("RAIDLOG_AUDIT_LOG_DIR") {
            self.audit_log_dir = value;
        }
        if let Ok(value) = env::var("RAIDLOG_RETENTION_DAYS") {
            self.retention_days = value.parse().unwrap_or(self.retention_days);
        }
        if let Ok(value) = env::var("RAIDLOG_WIPE_ON_NEW_WORLD") {
            self.wipe_on_new_world = value.parse().unwrap_or(self.wipe_on_new_world);
        }
        if let Ok(value) = env::var("RAIDLOG_SEARCH_RADIUS") {
            self.search_radius = value.parse().unwrap_or(self.search_radius);
        }
        if let Ok(value) = env::var("RAIDLOG_WORLD_SIZE") {
            self.world_size = value.parse().unwrap_or(self.world_size);
        }
        if let Ok(value) = env::var("RAIDLOG_ENABLE_NEW_TRACKERS") {
            self.enable_new_trackers = value.parse().unwrap_or(self.enable_new_trackers);
        }
        if let Ok(value) = env::var("RAIDLOG_IGNORED_TIERS") {
            self.ignored_tiers = parse_env_list(&value);
        }
        if let Ok(value) = env::var("RAIDLOG_EXCLUDED_EXPLOSIVES") {
            self.excluded_explosives = parse_env_list(&value);
        }
        if let Ok(value) = env::var("RAIDLOG_WEBHOOK_URL") {
            self.webhook.url = Some(value);
        }
        if let Ok(value) = env::var("RAIDLOG_WEBHOOK_MODE") {
            self.webhook.mode = value;
        }
        if let Ok(value) = env::var("RAIDLOG_DELIVERY_COOLDOWN_SECONDS") {
            self.delivery_cooldown_seconds = value.parse().unwrap_or(self.delivery_cooldown_seconds);
        }
        if let Ok(value) = env::var("RAIDLOG_DELIVERY_SUCCESS_DELAY_SECONDS") {
            self.delivery_success_delay_seconds =
                value.parse().unwrap_or(self.delivery_success_delay_seconds);
        }
        if let Ok(value) = env::var("RAIDLOG_MAX_RATE_LIMIT_RETRIES") {
            self.max_rate_limit_retries = value.parse().unwrap_or(self.max_rate_limit_retries);
        }
        if let Ok(value) = env::var("RAIDLOG_HOUSEKEEPING_INTERVAL_MINUTES") {
            self.housekeeping_interval_minutes =
                value.parse().unwrap_or(self.housekeeping_interval_minutes);
        }
        if let Ok(value) = env::var("RAIDLOG_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("RAIDLOG_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn parse_env_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn normalize_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = values
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_convert() {
        let config = AppConfig::default();
        config.validate().expect("defaults are valid");
        let runtime = config.to_runtime_config();
        assert_eq!(runtime.ignored_tiers, vec![BuildingTier::Twigs]);
        assert_eq!(runtime.delivery_cooldown_seconds, 200);
        assert_eq!(runtime.webhook.mode, WebhookMode::Embed);
        assert!(!runtime.webhook.enabled());
    }

    #[test]
    fn toml_overrides_and_normalizes() {
        let config = AppConfig::from_toml_str(
            r#"
            admin_token = "  "
            ignored_tiers = ["Twigs", "wood", "twigs"]
            search_radius = 75.0

            [outcome_labels]
            hit = "struck"

            [webhook]
            url = "https://hooks.example/abc"
            mode = "Simple"
            "#,
        )
        .expect("config");
        assert!(config.admin_token.is_none());
        assert_eq!(config.ignored_tiers, vec!["twigs", "wood"]);
        assert_eq!(config.outcome_labels.get("hit").map(String::as_str), Some("struck"));
        assert_eq!(config.outcome_labels.get("burned").map(String::as_str), Some("burnt"));
        let runtime = config.to_runtime_config();
        assert_eq!(runtime.webhook.mode, WebhookMode::Simple);
        assert_eq!(runtime.search_radius, 75.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AppConfig::from_toml_str("search_radius = 0.0").is_err());
        assert!(AppConfig::from_toml_str("ignored_tiers = [\"glass\"]").is_err());
        assert!(AppConfig::from_toml_str("bind_addr = \"nowhere\"").is_err());
        assert!(AppConfig::from_toml_str("[webhook]\nmode = \"fancy\"").is_err());
    }
}
