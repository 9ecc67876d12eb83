//! Discussion feed top-up.
//!
//! The branch is picked from the local and remote counts alone:
//!
//! | local            | remote  | action                                   |
//! |------------------|---------|------------------------------------------|
//! | `>= remote`      | any     | nothing                                  |
//! | `0`              | `> 0`   | walk every page from the start           |
//! | `0 < l < remote` | `> l`   | one `fetch_last_n(remote - local)` call  |
//!
//! Each fetched page is persisted as soon as it arrives, so a failure
//! mid-walk leaves the earlier pages stored and the next run resumes from
//! the new local count.

use mipsync_core::{ApiError, DiscussionApi, DiscussionStore};

use crate::error::SyncError;

/// What one discussion sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscussionOutcome {
    /// Local data already covers the remote total.
    UpToDate,
    /// Full paginated walk from an empty local dataset.
    FullWalk { pages: usize, records: u64 },
    /// Single "last N" fetch.
    TopUp { requested: u64, records: u64 },
    /// No discussion API configured.
    Skipped,
}

impl std::fmt::Display for DiscussionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscussionOutcome::UpToDate => write!(f, "up to date"),
            DiscussionOutcome::FullWalk { pages, records } => {
                write!(f, "fetched {records} records in {pages} pages")
            }
            DiscussionOutcome::TopUp { requested, records } => {
                write!(f, "fetched {records} of {requested} missing records")
            }
            DiscussionOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

pub struct DiscussionSync<'a> {
    api: &'a dyn DiscussionApi,
    store: &'a dyn DiscussionStore,
}

impl<'a> DiscussionSync<'a> {
    pub fn new(api: &'a dyn DiscussionApi, store: &'a dyn DiscussionStore) -> Self {
        Self { api, store }
    }

    /// Bring the store up to the remote total given `local_count` records.
    pub fn run(&self, local_count: u64) -> Result<DiscussionOutcome, SyncError> {
        let remote = self.api.count()?;
        tracing::info!("discussions: {local_count} local, {remote} remote");

        if local_count >= remote {
            return Ok(DiscussionOutcome::UpToDate);
        }
        if local_count == 0 {
            return self.full_walk();
        }
        self.top_up(remote - local_count)
    }

    fn full_walk(&self) -> Result<DiscussionOutcome, SyncError> {
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        let mut records = 0;
        loop {
            let page = self.api.fetch_page(cursor.as_deref())?;
            self.store.create(&page)?;
            pages += 1;
            records += page.edges.len() as u64;
            tracing::debug!("persisted discussion page {pages} ({} edges)", page.edges.len());

            if !page.has_next_page {
                break;
            }
            cursor = Some(page.end_cursor.ok_or(ApiError::MissingCursor)?);
        }
        Ok(DiscussionOutcome::FullWalk { pages, records })
    }

    fn top_up(&self, requested: u64) -> Result<DiscussionOutcome, SyncError> {
        let batch = self.api.fetch_last_n(requested)?;
        self.store.create(&batch)?;
        Ok(DiscussionOutcome::TopUp {
            requested,
            records: batch.edges.len() as u64,
        })
    }
}
