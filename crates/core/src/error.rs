use crate::issue::IssueStatus;
use crate::types::DbId;

/// Domain-level failures raised by the pure logic in this crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid issue transition: {from} -> {to}")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },
}

/// Failures reported by a storage adapter.
///
/// Adapters map their driver errors into [`StoreError::Backend`] so the
/// ingestion loop can treat every backend the same way: log and drop.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },
}
