// Domain errors

use thiserror::Error;

use crate::value_objects::EventIndex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RaidError {
    /// A category was resolved before anything registered into it.
    #[error("no weapon policies registered under category '{0}'")]
    UnknownCategory(String),
    #[error("event index {position} is out of range (log holds {len})")]
    IndexNotFound { position: usize, len: usize },
    #[error("event index {index:?} was issued before the log changed (now generation {current})")]
    StaleIndex { index: EventIndex, current: u64 },
}
