//! Error types for mipsync-sync.

use thiserror::Error;

use mipsync_core::{ApiError, ConfigError, SourceError, StoreError};

/// All errors that can end a sync stage.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Refreshing the source snapshot failed. Fatal for the whole run.
    #[error("source refresh failed: {0}")]
    Transport(#[source] SourceError),

    /// Any other document source failure.
    #[error("document source error: {0}")]
    Source(#[from] SourceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A discussion API failure; aborts only the discussion stage.
    #[error("discussion API error: {0}")]
    Api(#[from] ApiError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
