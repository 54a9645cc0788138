use std::collections::BTreeMap;

use raidlog_domain::{CatalogEntry, CatalogPayload, CatalogUpdateQuery};

use crate::{AppError, AppState};

/// Replaces or extends the item catalog, persists it and swaps it into the registry.
pub async fn update_catalog(
    state: &AppState,
    query: CatalogUpdateQuery,
    payload: CatalogPayload,
) -> Result<usize, AppError> {
    let incoming = normalize_entries(payload.items);
    let mode = query.mode.unwrap_or_else(|| "replace".to_string());
    if mode != "replace" && mode != "append" {
        return Err(AppError::BadRequest(format!(
            "unknown catalog update mode '{}'",
            mode
        )));
    }

    let mut engine = state.engine.lock().await;
    let existing = if mode == "append" {
        engine.catalog().entries().to_vec()
    } else {
        Vec::new()
    };
    let merged = merge_entries(existing, incoming);

    state
        .policy_repo
        .save_catalog(&merged)
        .await
        .map_err(AppError::Internal)?;
    let count = merged.len();
    engine.replace_catalog(merged);
    let dirty = engine.take_dirty_policies();
    drop(engine);

    crate::commands::store_commands::persist_tables(state, dirty, None).await;
    Ok(count)
}

fn normalize_entries(items: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    items
        .into_iter()
        .filter_map(|mut item| {
            item.identifier = item.identifier.trim().to_lowercase();
            if item.identifier.is_empty() {
                return None;
            }
            item.display_name = item
                .display_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty());
            item.aliases = item
                .aliases
                .into_iter()
                .map(|alias| alias.trim().to_lowercase())
                .filter(|alias| !alias.is_empty() && *alias != item.identifier)
                .collect();
            item.aliases.sort();
            item.aliases.dedup();
            Some(item)
        })
        .collect()
}

fn merge_entries(existing: Vec<CatalogEntry>, incoming: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut map = BTreeMap::new();
    for entry in existing.into_iter().chain(incoming) {
        map.insert(entry.identifier.clone(), entry);
    }
    map.into_values().collect()
}
