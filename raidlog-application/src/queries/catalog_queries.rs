use raidlog_domain::{CatalogEntry, CatalogQuery};

use crate::{AppError, AppState};

pub async fn list_catalog(
    state: &AppState,
    query: CatalogQuery,
) -> Result<Vec<CatalogEntry>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let query_text = query.query.unwrap_or_default().trim().to_lowercase();
    let engine = state.engine.lock().await;
    let mut results = Vec::new();
    for entry in engine.catalog().entries() {
        if query_text.is_empty()
            || entry.identifier.contains(&query_text)
            || entry
                .display_name
                .as_ref()
                .map(|name| name.to_lowercase().contains(&query_text))
                .unwrap_or(false)
            || entry.aliases.iter().any(|alias| alias.contains(&query_text))
        {
            results.push(entry.clone());
            if results.len() >= limit {
                break;
            }
        }
    }
    Ok(results)
}
