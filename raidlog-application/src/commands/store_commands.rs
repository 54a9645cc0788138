use chrono::Utc;
use raidlog_domain::value_objects::grid_label;
use raidlog_domain::{
    AttackerDeletion, DeletionReport, OwnershipIgnoreTable, PolicyTable, RadiusDeletion,
    RaidEvent, RangeDeletion,
};
use tracing::{info, warn};

use crate::{AppError, AppState};

/// Writes the event log if it changed since the last flush. Returns whether it wrote.
pub async fn flush_event_log(state: &AppState) -> Result<bool, AppError> {
    let mut engine = state.engine.lock().await;
    if !engine.store().needs_flush() {
        return Ok(false);
    }
    state
        .event_repo
        .save_events(engine.store().events())
        .await
        .map_err(AppError::Internal)?;
    engine.store_mut().mark_flushed();
    Ok(true)
}

/// Saves registry tables that changed; failures are logged and retried on the next change.
pub async fn persist_tables(
    state: &AppState,
    policies: Option<PolicyTable>,
    ignores: Option<OwnershipIgnoreTable>,
) {
    if let Some(table) = policies {
        if let Err(err) = state.policy_repo.save_policy_table(&table).await {
            warn!("failed to save weapon policies: {}", err);
        }
    }
    if let Some(table) = ignores {
        if let Err(err) = state.policy_repo.save_ignore_table(&table).await {
            warn!("failed to save ownership ignore table: {}", err);
        }
    }
}

/// Retention prune plus flush; run on the housekeeping interval.
pub async fn run_housekeeping(state: &AppState) -> Result<usize, AppError> {
    let pruned = {
        let mut engine = state.engine.lock().await;
        engine.prune_expired(Utc::now(), state.config.retention_days)
    };
    state.metrics.record_removed(pruned);
    flush_event_log(state).await?;
    Ok(pruned)
}

/// Expires in-flight explosives and flushes; run once on shutdown.
pub async fn shutdown(state: &AppState) -> Result<(), AppError> {
    let expired = state.engine.lock().await.expire_in_flight();
    if expired > 0 {
        info!("expired {} in-flight explosives on shutdown", expired);
    }
    flush_event_log(state).await?;
    Ok(())
}

pub async fn delete_by_radius(
    state: &AppState,
    request: RadiusDeletion,
) -> Result<DeletionReport, AppError> {
    let radius = request.radius.unwrap_or(state.config.search_radius);
    if radius.is_nan() || radius <= 0.0 {
        return Err(AppError::BadRequest("radius must be positive".to_string()));
    }
    let operator = operator_label(&request.operator_name, Some(request.operator_id));
    let label = format!(
        "{}_{}",
        grid_label(request.position, state.config.world_size),
        Utc::now().format("%H%M%S")
    );
    let position = request.position;
    remove_and_archive(state, &operator, &label, |event| {
        event.is_near(position, radius)
    })
    .await
}

pub async fn delete_by_attacker(
    state: &AppState,
    request: AttackerDeletion,
) -> Result<DeletionReport, AppError> {
    let operator = operator_label(&request.operator_name, None);
    let label = format!(
        "attacker_{}_{}",
        request.attacker_id,
        Utc::now().format("%H%M%S")
    );
    let attacker_id = request.attacker_id;
    remove_and_archive(state, &operator, &label, |event| {
        event.attacker_id == attacker_id
    })
    .await
}

pub async fn delete_by_range(
    state: &AppState,
    request: RangeDeletion,
) -> Result<DeletionReport, AppError> {
    if request.from > request.to {
        return Err(AppError::BadRequest(
            "range start must not be after range end".to_string(),
        ));
    }
    let operator = operator_label(&request.operator_name, None);
    let label = format!(
        "range_{}_{}_{}",
        request.from.format("%Y%m%d"),
        request.to.format("%Y%m%d"),
        Utc::now().format("%H%M%S")
    );
    let (from, to) = (request.from, request.to);
    remove_and_archive(state, &operator, &label, |event| {
        event.timestamp >= from && event.timestamp <= to
    })
    .await
}

pub async fn wipe_all(state: &AppState, operator_name: &str) -> Result<DeletionReport, AppError> {
    let operator = operator_label(operator_name, None);
    let label = format!("all_{}", Utc::now().format("%H%M%S"));
    remove_and_archive(state, &operator, &label, |_| true).await
}

async fn remove_and_archive<F>(
    state: &AppState,
    operator: &str,
    label: &str,
    predicate: F,
) -> Result<DeletionReport, AppError>
where
    F: FnMut(&RaidEvent) -> bool,
{
    let removed = {
        let mut engine = state.engine.lock().await;
        engine.store_mut().remove_where(predicate)
    };
    if removed.is_empty() {
        return Ok(DeletionReport {
            removed: 0,
            archive: None,
        });
    }
    state.metrics.record_removed(removed.len());

    let archive_label = format!(
        "{}/{}/{}",
        Utc::now().format("%Y-%m-%d"),
        sanitize_segment(operator),
        label
    );
    let archive = match state.event_repo.archive_events(&archive_label, &removed).await {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("failed to archive deleted raid events: {}", err);
            None
        }
    };
    info!(
        target: "raidlog::audit",
        "{} deleted {} raid events ({}), archive: {}",
        operator,
        removed.len(),
        label,
        archive.as_deref().unwrap_or("none")
    );
    flush_event_log(state).await?;
    Ok(DeletionReport {
        removed: removed.len(),
        archive,
    })
}

fn operator_label(name: &str, id: Option<u64>) -> String {
    let name = name.trim();
    match (name.is_empty(), id) {
        (false, Some(id)) => format!("{}[{}]", name, id),
        (false, None) => name.to_string(),
        (true, Some(id)) => id.to_string(),
        (true, None) => "operator".to_string(),
    }
}

fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '[' | ']') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "operator".to_string()
    } else {
        cleaned
    }
}
