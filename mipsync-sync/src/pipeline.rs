//! Sync orchestration: the single entrypoint used by the CLI and daemon.
//!
//! ## Stages of one run
//!
//! 1. `RefreshSource`: `pull`, `list_files`, `get_all`. Any failure here
//!    aborts the run.
//! 2. `Reconcile`: create/update/delete against the store.
//! 3. `LinkHierarchy`: group fathers, set references, recompute counts.
//! 4. `SyncDiscussions`: top up the discussion store.
//! 5. `persist_meta_variables`.
//!
//! Failures in stages 3 to 5 are logged and the run still succeeds.

use std::path::Path;
use std::sync::Arc;

use mipsync_core::{
    config::SourceKind,
    store::{JsonDiscussionStore, JsonProposalStore},
    Config, DiscussionApi, DiscussionStore, DocumentSource, ProposalStore, SynchronizeResult,
};
use mipsync_parser::{DocumentParser, ProposalParser};

use crate::discussions::{DiscussionOutcome, DiscussionSync};
use crate::error::SyncError;
use crate::github::GithubDiscussionApi;
use crate::link::{link_hierarchy, LinkReport};
use crate::reconcile::ReconciliationEngine;
use crate::source::{DirectoryDocumentSource, GitDocumentSource};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub result: SynchronizeResult,
    /// `None` when the linking stage failed.
    pub hierarchy: Option<LinkReport>,
    /// `None` when the discussion stage failed.
    pub discussions: Option<DiscussionOutcome>,
}

/// Wires the collaborators of one sync run.
pub struct Synchronizer {
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn ProposalStore>,
    parser: Arc<dyn DocumentParser>,
    discussion_store: Arc<dyn DiscussionStore>,
    discussion_api: Option<Arc<dyn DiscussionApi>>,
    remote: String,
    branch: String,
}

impl Synchronizer {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn ProposalStore>,
        parser: Arc<dyn DocumentParser>,
        discussion_store: Arc<dyn DiscussionStore>,
    ) -> Self {
        Self {
            source,
            store,
            parser,
            discussion_store,
            discussion_api: None,
            remote: "origin".to_string(),
            branch: "master".to_string(),
        }
    }

    pub fn with_discussion_api(mut self, api: Arc<dyn DiscussionApi>) -> Self {
        self.discussion_api = Some(api);
        self
    }

    pub fn with_branch(mut self, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        self.remote = remote.into();
        self.branch = branch.into();
        self
    }

    /// Build the production wiring for `config`.
    ///
    /// Stores live under the config's data directory, resolved against
    /// `home`. A discussions section without a token in the environment is
    /// an error.
    pub fn from_config(config: &Config, home: &Path) -> Result<Self, SyncError> {
        let data_dir = config.data_dir_at(home);
        let repo = &config.repository;
        let source: Arc<dyn DocumentSource> = match repo.kind {
            SourceKind::Git => Arc::new(GitDocumentSource::new(
                repo.path.clone(),
                data_dir.clone(),
                repo.include_prefix.clone(),
            )),
            SourceKind::Directory => Arc::new(DirectoryDocumentSource::new(
                repo.path.clone(),
                data_dir.clone(),
                repo.include_prefix.clone(),
            )),
        };

        let mut synchronizer = Self::new(
            source,
            Arc::new(JsonProposalStore::new(&data_dir)),
            Arc::new(ProposalParser::new(config.hierarchy.subproposal_rule)),
            Arc::new(JsonDiscussionStore::new(&data_dir)),
        )
        .with_branch(repo.remote.clone(), repo.branch.clone());

        if let Some(discussions) = &config.discussions {
            let api = GithubDiscussionApi::from_config(discussions)?;
            synchronizer = synchronizer.with_discussion_api(Arc::new(api));
        }
        Ok(synchronizer)
    }

    /// Run every stage and report what happened.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        tracing::info!("pulling {}/{}", self.remote, self.branch);
        self.source
            .pull(&self.remote, &self.branch)
            .map_err(SyncError::Transport)?;
        let files = self.source.list_files()?;
        let stored = self.store.get_all()?;
        tracing::info!("{} tracked files, {} stored proposals", files.len(), stored.len());

        let engine =
            ReconciliationEngine::new(&*self.source, &*self.store, &*self.parser);
        let result = engine.reconcile(&files, &stored);
        tracing::info!("synchronized proposals: {result}");

        let hierarchy = match link_hierarchy(&*self.store) {
            Ok(report) => {
                tracing::info!(
                    "linked {} of {} fathers, {} subproposal counts updated",
                    report.linked,
                    report.fathers,
                    report.counts_updated
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!("hierarchy linking failed: {e}");
                None
            }
        };

        let discussions = match self.sync_discussions() {
            Ok(outcome) => {
                tracing::info!("discussions: {outcome}");
                Some(outcome)
            }
            Err(e) => {
                tracing::error!("discussion sync failed: {e}");
                None
            }
        };

        if let Err(e) = self.source.persist_meta_variables() {
            tracing::error!("failed to persist meta variables: {e}");
        }

        Ok(SyncReport {
            result,
            hierarchy,
            discussions,
        })
    }

    /// Run once; `false` only when the source refresh stage failed.
    pub fn run_sync(&self) -> bool {
        match self.run() {
            Ok(_) => {
                tracing::info!("sync complete");
                true
            }
            Err(e) => {
                tracing::error!("sync aborted: {e}");
                false
            }
        }
    }

    fn sync_discussions(&self) -> Result<DiscussionOutcome, SyncError> {
        let Some(api) = self.discussion_api.as_deref() else {
            tracing::info!("no discussion API configured; skipping discussions");
            return Ok(DiscussionOutcome::Skipped);
        };
        let local = self.discussion_store.count()?;
        DiscussionSync::new(api, &*self.discussion_store).run(local)
    }
}
