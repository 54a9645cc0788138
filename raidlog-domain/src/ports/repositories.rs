use async_trait::async_trait;

use crate::entities::{CatalogEntry, OwnershipIgnoreTable, PolicyTable, RaidEvent};

#[async_trait]
pub trait EventLogRepository: Send + Sync {
    async fn load_events(&self) -> anyhow::Result<Vec<RaidEvent>>;
    async fn save_events(&self, events: &[RaidEvent]) -> anyhow::Result<()>;
    /// Writes removed records aside; returns where they went.
    async fn archive_events(&self, label: &str, events: &[RaidEvent]) -> anyhow::Result<String>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn load_policy_table(&self) -> anyhow::Result<Option<PolicyTable>>;
    async fn save_policy_table(&self, table: &PolicyTable) -> anyhow::Result<()>;

    async fn load_ignore_table(&self) -> anyhow::Result<OwnershipIgnoreTable>;
    async fn save_ignore_table(&self, table: &OwnershipIgnoreTable) -> anyhow::Result<()>;

    async fn load_catalog(&self) -> anyhow::Result<Vec<CatalogEntry>>;
    async fn save_catalog(&self, entries: &[CatalogEntry]) -> anyhow::Result<()>;
}
