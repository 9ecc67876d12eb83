//! Recording fakes for the collaborator traits.
//!
//! Every fake appends the name of each call to a shared [`CallLog`] so tests
//! can assert both counts and ordering.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mipsync_core::{
    hierarchy, ApiError, DiscussionApi, DiscussionBatch, DiscussionStore, DocumentSource, GitFile,
    Proposal, ProposalId, ProposalMap, ProposalStore, SourceError, StoreError,
};
use mipsync_parser::{DocumentParser, ProposalParser};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.0.lock().expect("log lock").push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().expect("log lock").clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct FakeSource {
    pub log: CallLog,
    pub files: Mutex<Vec<(GitFile, String)>>,
    pub fail_pull: bool,
}

impl FakeSource {
    pub fn new(log: &CallLog, docs: &[(&str, &str, &str)]) -> Self {
        let source = Self {
            log: log.clone(),
            files: Mutex::new(Vec::new()),
            fail_pull: false,
        };
        source.set(docs);
        source
    }

    /// Replace the tree with `(filename, hash, content)` triples.
    pub fn set(&self, docs: &[(&str, &str, &str)]) {
        *self.files.lock().expect("files lock") = docs
            .iter()
            .map(|(name, hash, content)| (GitFile::new(*name, *hash), content.to_string()))
            .collect();
    }
}

impl DocumentSource for FakeSource {
    fn pull(&self, remote: &str, branch: &str) -> Result<(), SourceError> {
        self.log.record("pull");
        if self.fail_pull {
            return Err(SourceError::Transport {
                remote: remote.to_string(),
                branch: branch.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<GitFile>, SourceError> {
        self.log.record("list_files");
        Ok(self
            .files
            .lock()
            .expect("files lock")
            .iter()
            .map(|(f, _)| f.clone())
            .collect())
    }

    fn read_file(&self, filename: &str) -> Result<String, SourceError> {
        self.log.record("read_file");
        self.files
            .lock()
            .expect("files lock")
            .iter()
            .find(|(f, _)| f.filename == filename)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| SourceError::Io {
                path: filename.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
    }

    fn persist_meta_variables(&self) -> Result<(), SourceError> {
        self.log.record("persist_meta_variables");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Proposal store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeStore {
    pub log: CallLog,
    pub proposals: Mutex<ProposalMap>,
    pub next_id: Mutex<u64>,
    pub deletions: Mutex<Vec<Vec<ProposalId>>>,
    /// Filenames whose `update` fails.
    pub fail_updates: Vec<String>,
    /// Filenames whose `create` fails.
    pub fail_creates: Vec<String>,
}

impl FakeStore {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            next_id: Mutex::new(1),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> ProposalMap {
        self.proposals.lock().expect("store lock").clone()
    }
}

impl ProposalStore for FakeStore {
    fn get_all(&self) -> Result<ProposalMap, StoreError> {
        self.log.record("get_all");
        Ok(self.snapshot())
    }

    fn create(&self, mut proposal: Proposal) -> Result<Proposal, StoreError> {
        self.log.record("create");
        if self.fail_creates.contains(&proposal.filename) {
            return Err(StoreError::NotFound {
                id: ProposalId(proposal.filename.clone()),
            });
        }
        let mut next = self.next_id.lock().expect("id lock");
        proposal.id = Some(ProposalId(format!("p{next}")));
        *next += 1;
        self.proposals
            .lock()
            .expect("store lock")
            .insert(proposal.filename.clone(), proposal.clone());
        Ok(proposal)
    }

    fn create_many(&self, proposals: Vec<Proposal>) -> Vec<Result<Proposal, StoreError>> {
        self.log.record("create_many");
        proposals.into_iter().map(|p| self.create(p)).collect()
    }

    fn update(&self, id: &ProposalId, proposal: Proposal) -> Result<Proposal, StoreError> {
        self.log.record("update");
        if self.fail_updates.contains(&proposal.filename) {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        self.proposals
            .lock()
            .expect("store lock")
            .insert(proposal.filename.clone(), proposal.clone());
        Ok(proposal)
    }

    fn delete_many(&self, ids: &[ProposalId]) -> Result<(), StoreError> {
        self.log.record("delete_many");
        self.deletions.lock().expect("deletions lock").push(ids.to_vec());
        self.proposals
            .lock()
            .expect("store lock")
            .retain(|_, p| p.id.as_ref().map_or(true, |id| !ids.contains(id)));
        Ok(())
    }

    fn group_by_relation(&self) -> Result<Vec<Proposal>, StoreError> {
        self.log.record("group_by_relation");
        Ok(hierarchy::group_fathers(&self.snapshot()))
    }

    fn set_father_references(&self, ids: &[ProposalId]) -> Result<Vec<bool>, StoreError> {
        self.log.record("set_father_references");
        let mut proposals = self.proposals.lock().expect("store lock");
        Ok(hierarchy::link_fathers(&mut proposals, ids))
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingParser {
    pub inner: ProposalParser,
    pub parsed: Mutex<Vec<String>>,
}

impl CountingParser {
    pub fn parses(&self) -> usize {
        self.parsed.lock().expect("parse lock").len()
    }
}

impl DocumentParser for CountingParser {
    fn parse(&self, raw: &str, descriptor: &GitFile) -> Proposal {
        self.parsed
            .lock()
            .expect("parse lock")
            .push(descriptor.filename.clone());
        self.inner.parse(raw, descriptor)
    }
}

// ---------------------------------------------------------------------------
// Discussions
// ---------------------------------------------------------------------------

/// A remote feed of `total` records served `page_size` at a time.
pub struct FakeApi {
    pub log: CallLog,
    pub total: u64,
    pub page_size: u64,
    /// 0-based page index that fails.
    pub fail_page: Option<usize>,
    pub cursors: Mutex<Vec<Option<String>>>,
    pub last_n: Mutex<Vec<u64>>,
}

impl FakeApi {
    pub fn new(log: &CallLog, total: u64, page_size: u64) -> Self {
        Self {
            log: log.clone(),
            total,
            page_size,
            fail_page: None,
            cursors: Mutex::new(Vec::new()),
            last_n: Mutex::new(Vec::new()),
        }
    }

    fn edges(range: std::ops::Range<u64>) -> Vec<serde_json::Value> {
        range.map(|n| json!({ "node": { "number": n } })).collect()
    }
}

impl DiscussionApi for FakeApi {
    fn count(&self) -> Result<u64, ApiError> {
        self.log.record("api_count");
        Ok(self.total)
    }

    fn fetch_page(&self, cursor: Option<&str>) -> Result<DiscussionBatch, ApiError> {
        self.log.record("fetch_page");
        let mut cursors = self.cursors.lock().expect("cursor lock");
        let index = cursors.len();
        cursors.push(cursor.map(str::to_string));
        if self.fail_page == Some(index) {
            return Err(ApiError::Http("connection reset".into()));
        }

        let start: u64 = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(self.total);
        Ok(DiscussionBatch {
            edges: Self::edges(start..end),
            end_cursor: Some(end.to_string()),
            has_next_page: end < self.total,
            total_count: (start == 0).then_some(self.total),
        })
    }

    fn fetch_last_n(&self, n: u64) -> Result<DiscussionBatch, ApiError> {
        self.log.record("fetch_last_n");
        self.last_n.lock().expect("last lock").push(n);
        Ok(DiscussionBatch {
            edges: Self::edges(self.total.saturating_sub(n)..self.total),
            end_cursor: None,
            has_next_page: false,
            total_count: None,
        })
    }
}

#[derive(Default)]
pub struct FakeDiscussionStore {
    pub log: CallLog,
    pub initial: u64,
    pub batches: Mutex<Vec<DiscussionBatch>>,
}

impl FakeDiscussionStore {
    pub fn new(log: &CallLog, initial: u64) -> Self {
        Self {
            log: log.clone(),
            initial,
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn stored_edges(&self) -> u64 {
        self.batches
            .lock()
            .expect("batch lock")
            .iter()
            .map(|b| b.edges.len() as u64)
            .sum()
    }
}

impl DiscussionStore for FakeDiscussionStore {
    fn count(&self) -> Result<u64, StoreError> {
        self.log.record("discussion_count");
        Ok(self.initial + self.stored_edges())
    }

    fn create(&self, batch: &DiscussionBatch) -> Result<(), StoreError> {
        self.log.record("discussion_create");
        self.batches.lock().expect("batch lock").push(batch.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const MIP4: &str = "# MIP4: Policy\n\n## Preamble\n\n```\nMIP#: 4\nStatus: Accepted\n```\n\n## Component Summary\n\n**MIP4c1: Process**\nSteps.\n\n**MIP4c2: Onboarding**\nSubproposals.\n\n## Motivation\n\nWhy.\n";

pub const MIP4_SP1: &str = "# MIP4c2-SP1: First Onboarding\n\n## Preamble\n\n```\nMIP4c2-SP#: 1\nStatus: RFC\n```\n";

pub const MIP5: &str = "# MIP5: Other\n\n## Preamble\n\n```\nMIP#: 5\n```\n";
