use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;

use raidlog_domain::{EventLogRepository, RaidEvent};

/// Event log kept as one JSON array on disk, with deletions archived next to it.
pub struct JsonEventLogRepository {
    path: PathBuf,
    archive_dir: PathBuf,
}

impl JsonEventLogRepository {
    pub fn new(path: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive_dir: archive_dir.into(),
        }
    }
}

pub(crate) async fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Writes through a sibling temp file so a crash never leaves a half-written log.
pub(crate) async fn write_replacing(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    ensure_parent(path).await?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl EventLogRepository for JsonEventLogRepository {
    async fn load_events(&self) -> anyhow::Result<Vec<RaidEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let events: Vec<RaidEvent> = serde_json::from_str(&content)
            .with_context(|| format!("malformed event log {}", self.path.display()))?;
        Ok(events)
    }

    async fn save_events(&self, events: &[RaidEvent]) -> anyhow::Result<()> {
        let content = serde_json::to_vec(events)?;
        write_replacing(&self.path, &content).await
    }

    async fn archive_events(&self, label: &str, events: &[RaidEvent]) -> anyhow::Result<String> {
        let path = self.archive_dir.join(format!("{}.json", label));
        let content = serde_json::to_vec_pretty(events)?;
        write_replacing(&path, &content).await?;
        Ok(path.to_string_lossy().to_string())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        ensure_parent(&self.path).await?;
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let metadata = fs::metadata(parent).await?;
        if metadata.permissions().readonly() {
            anyhow::bail!("event log directory {} is read-only", parent.display());
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "raidlog-{}-{}-{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ))
}
