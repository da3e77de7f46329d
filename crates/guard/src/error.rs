use machwatch_core::error::{CoreError, StoreError};

/// Errors surfaced by the guard services.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}
