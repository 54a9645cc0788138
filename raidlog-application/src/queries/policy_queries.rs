use raidlog_domain::{PolicyListQuery, PolicyListing};

use crate::{AppError, AppState};

pub async fn list_policies(
    state: &AppState,
    query: PolicyListQuery,
) -> Result<Vec<PolicyListing>, AppError> {
    let category = query
        .category
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());
    let query_text = query.query.unwrap_or_default().trim().to_lowercase();

    let engine = state.engine.lock().await;
    let registry = engine.registry();
    if let Some(category) = &category {
        if !registry.table().has_category(category) {
            return Err(AppError::NotFound(format!("category '{}'", category)));
        }
    }
    Ok(registry
        .listings(category.as_deref())
        .into_iter()
        .filter(|listing| {
            query_text.is_empty()
                || listing.identifier.to_lowercase().contains(&query_text)
                || listing.configured.name.to_lowercase().contains(&query_text)
        })
        .collect())
}
