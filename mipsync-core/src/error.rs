//! Error types for mipsync-core and its collaborator traits.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProposalId;

/// Failures of a [`DocumentSource`](crate::traits::DocumentSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Refreshing from the remote failed (network, auth, merge conflict).
    #[error("failed to pull {remote}/{branch}: {message}")]
    Transport {
        remote: String,
        branch: String,
        message: String,
    },

    /// Reading the repository index or refs failed.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing last-sync bookkeeping failed.
    #[error("meta variables error: {0}")]
    Meta(#[from] StoreError),
}

/// Failures of the proposal and discussion stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write path).
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Corrupt store document on load.
    #[error("failed to parse store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("proposal {id} not found")]
    NotFound { id: ProposalId },
}

/// Failures of the discussion API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("discussion API request failed: {0}")]
    Http(String),

    #[error("discussion API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed discussion API response: {0}")]
    MalformedResponse(String),

    /// A page claimed more results but carried no cursor to continue from.
    #[error("page reported more results without an end cursor")]
    MissingCursor,

    #[error("API token not set (expected in ${0})")]
    MissingToken(String),
}

/// Failures loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("config not found at {path}; run `mipsync init` first")]
    NotFound { path: PathBuf },
}

pub(crate) fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
