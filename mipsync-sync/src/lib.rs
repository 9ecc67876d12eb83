//! # mipsync-sync
//!
//! Reconciliation, hierarchy linking and discussion top-up.
//!
//! Build a [`Synchronizer`] (directly from collaborators, or with
//! [`Synchronizer::from_config`]) and call [`Synchronizer::run_sync`].

pub mod discussions;
pub mod error;
pub mod github;
pub mod link;
pub mod pipeline;
pub mod reconcile;
pub mod source;

pub use discussions::{DiscussionOutcome, DiscussionSync};
pub use error::SyncError;
pub use github::GithubDiscussionApi;
pub use link::{link_hierarchy, LinkReport};
pub use pipeline::{SyncReport, Synchronizer};
pub use reconcile::ReconciliationEngine;
pub use source::{DirectoryDocumentSource, GitDocumentSource};
