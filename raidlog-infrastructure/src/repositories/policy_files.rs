use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;

use raidlog_domain::{CatalogEntry, OwnershipIgnoreTable, PolicyRepository, PolicyTable};

use super::event_log_files::write_replacing;

const DEFAULT_POLICY_TABLE: &str = include_str!("../../assets/default_weapon_policies.yaml");

/// Policy table shipped with the service, used when none exists on disk yet.
pub fn default_policy_table() -> anyhow::Result<PolicyTable> {
    let table: PolicyTable = serde_yaml::from_str(DEFAULT_POLICY_TABLE)?;
    Ok(table)
}

/// Operator-editable tables: YAML for policies and ownership switches, JSON for the catalog.
pub struct PolicyFileRepository {
    policy_path: PathBuf,
    ignore_path: PathBuf,
    catalog_path: PathBuf,
}

impl PolicyFileRepository {
    pub fn new(
        policy_path: impl Into<PathBuf>,
        ignore_path: impl Into<PathBuf>,
        catalog_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            policy_path: policy_path.into(),
            ignore_path: ignore_path.into(),
            catalog_path: catalog_path.into(),
        }
    }
}

#[async_trait]
impl PolicyRepository for PolicyFileRepository {
    async fn load_policy_table(&self) -> anyhow::Result<Option<PolicyTable>> {
        if !self.policy_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.policy_path).await?;
        let table: PolicyTable = serde_yaml::from_str(&content)
            .with_context(|| format!("malformed policy table {}", self.policy_path.display()))?;
        Ok(Some(table))
    }

    async fn save_policy_table(&self, table: &PolicyTable) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(table)?;
        write_replacing(&self.policy_path, content.as_bytes()).await
    }

    async fn load_ignore_table(&self) -> anyhow::Result<OwnershipIgnoreTable> {
        if !self.ignore_path.exists() {
            return Ok(OwnershipIgnoreTable::default());
        }
        let content = fs::read_to_string(&self.ignore_path).await?;
        if content.trim().is_empty() {
            return Ok(OwnershipIgnoreTable::default());
        }
        let table: OwnershipIgnoreTable = serde_yaml::from_str(&content)
            .with_context(|| format!("malformed ignore table {}", self.ignore_path.display()))?;
        Ok(table)
    }

    async fn save_ignore_table(&self, table: &OwnershipIgnoreTable) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(table)?;
        write_replacing(&self.ignore_path, content.as_bytes()).await
    }

    async fn load_catalog(&self) -> anyhow::Result<Vec<CatalogEntry>> {
        if !self.catalog_path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.catalog_path).await?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
            .with_context(|| format!("malformed item catalog {}", self.catalog_path.display()))?;
        Ok(entries)
    }

    async fn save_catalog(&self, entries: &[CatalogEntry]) -> anyhow::Result<()> {
        let content = serde_json::to_vec(entries)?;
        write_replacing(&self.catalog_path, &content).await
    }
}
