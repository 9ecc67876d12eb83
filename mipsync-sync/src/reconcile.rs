//! Hash-gated reconciliation of the source tree against stored proposals.
//!
//! ## `reconcile` per pass
//!
//! 1. Collect stored filenames missing from the current file set.
//! 2. New filename: read and parse; collected for step 5.
//! 3. Known filename with a different hash: read, parse, `update`.
//! 4. Known filename with the same hash: skipped, never parsed.
//! 5. One `create_many` with every proposal from step 2.
//! 6. One `delete_many` with every id from step 1.
//!
//! Store failures are logged and never abort the pass.

use std::collections::HashSet;

use mipsync_core::{
    DocumentSource, GitFile, Proposal, ProposalId, ProposalMap, ProposalStore, SynchronizeResult,
};
use mipsync_parser::DocumentParser;

/// Diffs the observed file set against the stored map.
pub struct ReconciliationEngine<'a> {
    source: &'a dyn DocumentSource,
    store: &'a dyn ProposalStore,
    parser: &'a dyn DocumentParser,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(
        source: &'a dyn DocumentSource,
        store: &'a dyn ProposalStore,
        parser: &'a dyn DocumentParser,
    ) -> Self {
        Self {
            source,
            store,
            parser,
        }
    }

    /// Classify every file as create/update/skip/delete and apply it.
    ///
    /// Counts record attempted store calls: a failed `create` or `update`
    /// is logged and still counted.
    pub fn reconcile(&self, current: &[GitFile], stored: &ProposalMap) -> SynchronizeResult {
        let present: HashSet<&str> = current.iter().map(|f| f.filename.as_str()).collect();
        let deletions: Vec<ProposalId> = stored
            .iter()
            .filter(|(filename, _)| !present.contains(filename.as_str()))
            .filter_map(|(_, proposal)| proposal.id.clone())
            .collect();

        let mut result = SynchronizeResult::default();
        let mut creates = Vec::new();
        for file in current {
            match stored.get(&file.filename) {
                None => creates.extend(self.parse_document(file)),
                Some(existing) => {
                    if self.update_if_different_hash(file, existing) {
                        result.updates += 1;
                    }
                }
            }
        }

        result.creates = creates.len();
        self.create_all(creates);

        if let Err(e) = self.store.delete_many(&deletions) {
            tracing::error!("failed to delete {} proposals: {e}", deletions.len());
        }
        result.deletes = deletions.len();
        result
    }

    /// Re-parse and update `existing` when `file` carries a new hash.
    ///
    /// Returns `true` when an update was attempted, even if the store
    /// rejected it.
    pub fn update_if_different_hash(&self, file: &GitFile, existing: &Proposal) -> bool {
        if existing.hash == file.hash {
            tracing::debug!("unchanged: {}", file.filename);
            return false;
        }
        let Some(id) = existing.id.clone() else {
            tracing::warn!("stored proposal {} has no id; skipping update", file.filename);
            return false;
        };
        let Some(mut parsed) = self.parse_document(file) else {
            return false;
        };

        parsed.id = Some(id.clone());
        parsed.father_id = existing.father_id.clone();
        parsed.subproposals_count = existing.subproposals_count;

        match self.store.update(&id, parsed) {
            Ok(_) => tracing::info!("updated: {}", file.filename),
            Err(e) => tracing::error!("failed to update {}: {e}", file.filename),
        }
        true
    }

    /// Read `file` from the source and parse it.
    ///
    /// `None` when the file cannot be read; the parser itself never fails.
    pub fn parse_document(&self, file: &GitFile) -> Option<Proposal> {
        match self.source.read_file(&file.filename) {
            Ok(raw) => Some(self.parser.parse(&raw, file)),
            Err(e) => {
                tracing::error!("failed to read {}: {e}", file.filename);
                None
            }
        }
    }

    fn create_all(&self, proposals: Vec<Proposal>) {
        if proposals.is_empty() {
            return;
        }
        let count = proposals.len();
        for outcome in self.store.create_many(proposals) {
            match outcome {
                Ok(created) => tracing::info!("created: {}", created.filename),
                Err(e) => tracing::error!("failed to create proposals ({count} submitted): {e}"),
            }
        }
    }
}
