//! mipsync core library — domain types, collaborator traits, stores, config.
//!
//! - [`types`] — proposals, source descriptors, discussion batches
//! - [`traits`] — contracts for sources, stores and the discussion feed
//! - [`error`] — one error enum per collaborator
//! - [`store`] — JSON-file stores
//! - [`hierarchy`] — father/subproposal grouping
//! - [`config`] — `~/.mipsync/config.yaml`

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod store;
pub mod traits;
pub mod types;

pub use config::{Config, SourceKind, SubproposalRule};
pub use error::{ApiError, ConfigError, SourceError, StoreError};
pub use traits::{DiscussionApi, DiscussionStore, DocumentSource, ProposalStore};
pub use types::{
    Component, DiscussionBatch, GitFile, Language, Preamble, Proposal, ProposalId, ProposalMap,
    Reference, SynchronizeResult,
};
