//! Collaborator contracts consumed by the synchronization engine.
//!
//! Every method takes `&self`; implementations that keep state in memory use
//! interior mutability so one instance can be shared across a run.

use crate::error::{ApiError, SourceError, StoreError};
use crate::types::{DiscussionBatch, GitFile, Proposal, ProposalId, ProposalMap};

// ── Document source ─────────────────────────────────────────────────────────

/// Local snapshot of the proposal repository.
pub trait DocumentSource: Send + Sync {
    /// Refresh the local snapshot from `remote`/`branch`.
    fn pull(&self, remote: &str, branch: &str) -> Result<(), SourceError>;

    /// Tracked files, in a stable order.
    fn list_files(&self) -> Result<Vec<GitFile>, SourceError>;

    /// Full text of a tracked file.
    fn read_file(&self, filename: &str) -> Result<String, SourceError>;

    /// Record last-sync bookkeeping.
    fn persist_meta_variables(&self) -> Result<(), SourceError>;
}

// ── Stores ──────────────────────────────────────────────────────────────────

/// Persisted proposals.
pub trait ProposalStore: Send + Sync {
    /// Every stored proposal keyed by filename.
    fn get_all(&self) -> Result<ProposalMap, StoreError>;

    /// Insert a new proposal; the returned copy carries the assigned id.
    fn create(&self, proposal: Proposal) -> Result<Proposal, StoreError>;

    /// Insert several new proposals, in order, with one result per attempt.
    ///
    /// Defaults to one `create` per proposal, so a failure only affects its
    /// own item. Stores that rewrite a whole document per write override it
    /// to write once; a failed write is then reported as a single error.
    fn create_many(&self, proposals: Vec<Proposal>) -> Vec<Result<Proposal, StoreError>> {
        proposals.into_iter().map(|p| self.create(p)).collect()
    }

    /// Replace the proposal stored under `id`.
    fn update(&self, id: &ProposalId, proposal: Proposal) -> Result<Proposal, StoreError>;

    /// Remove every proposal in `ids` in one call.
    fn delete_many(&self, ids: &[ProposalId]) -> Result<(), StoreError>;

    /// Fathers that have at least one subproposal, in filename order.
    fn group_by_relation(&self) -> Result<Vec<Proposal>, StoreError>;

    /// Stamp `father_id` on the subproposals of each father in `ids` and
    /// clear it everywhere else.
    ///
    /// Returns one flag per id: `false` when the father no longer exists.
    fn set_father_references(&self, ids: &[ProposalId]) -> Result<Vec<bool>, StoreError>;
}

/// Persisted discussion records.
pub trait DiscussionStore: Send + Sync {
    fn count(&self) -> Result<u64, StoreError>;

    /// Persist one batch of edges.
    fn create(&self, batch: &DiscussionBatch) -> Result<(), StoreError>;
}

// ── Discussion feed ─────────────────────────────────────────────────────────

/// Cursor-paginated remote discussion feed.
pub trait DiscussionApi: Send + Sync {
    /// Total number of remote records.
    fn count(&self) -> Result<u64, ApiError>;

    /// One page from the start (`None`) or after `cursor`.
    fn fetch_page(&self, cursor: Option<&str>) -> Result<DiscussionBatch, ApiError>;

    /// The `n` most recent records in a single page.
    fn fetch_last_n(&self, n: u64) -> Result<DiscussionBatch, ApiError>;
}
