use raidlog_domain::RaidError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invariant violated: {0}")]
    Invariant(#[from] RaidError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
