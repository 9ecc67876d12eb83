//! Father/subproposal linking stage.

use mipsync_core::{hierarchy, ProposalId, ProposalStore, StoreError};

/// Outcome of one linking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkReport {
    /// Fathers returned by `group_by_relation`.
    pub fathers: usize,
    /// Fathers whose references were set.
    pub linked: usize,
    /// Fathers whose `subproposals_count` changed and was persisted.
    pub counts_updated: usize,
}

/// Group, link, then recompute subproposal counts.
///
/// Failing to persist one father's count is logged and skipped; failures
/// of the grouping or linking calls end the stage.
pub fn link_hierarchy(store: &dyn ProposalStore) -> Result<LinkReport, StoreError> {
    let fathers = store.group_by_relation()?;
    let ids: Vec<ProposalId> = fathers.iter().filter_map(|f| f.id.clone()).collect();
    let flags = store.set_father_references(&ids)?;

    let mut report = LinkReport {
        fathers: fathers.len(),
        linked: flags.iter().filter(|linked| **linked).count(),
        counts_updated: 0,
    };

    let all = store.get_all()?;
    let counts = hierarchy::subproposal_counts(&all);
    for proposal in all.values().filter(|p| !p.is_subproposal()) {
        let Some(id) = proposal.id.as_ref() else {
            continue;
        };
        let count = counts.get(id).copied().unwrap_or(0);
        if proposal.subproposals_count == count {
            continue;
        }
        let mut updated = proposal.clone();
        updated.subproposals_count = count;
        match store.update(id, updated) {
            Ok(_) => report.counts_updated += 1,
            Err(e) => tracing::error!(
                "failed to update subproposal count of {}: {e}",
                proposal.filename
            ),
        }
    }
    Ok(report)
}
