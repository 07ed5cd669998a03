use daytrack_store::StoreError;
use thiserror::Error;

/// Errors surfaced by [`TaskService`](crate::service::TaskService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Task not found")]
    TaskNotFound(String),

    #[error("task text must be a non-empty line and must not start with \"[!]\"")]
    InvalidText,

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("no tasks recorded for {0}")]
    DayNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
