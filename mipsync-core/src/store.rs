//! JSON-file stores for proposals, discussions, and sync bookkeeping.
//!
//! # Storage layout
//!
//! ```text
//! <data_dir>/
//!   proposals.json    (ProposalStoreFile)
//!   discussions.json  (DiscussionStoreFile)
//!   meta.json         (MetaVariables)
//! ```
//!
//! Every write serializes to a `.json.tmp` sibling and renames it over the
//! target, so a crash never leaves a half-written document behind. Each
//! operation loads, mutates and saves the whole document; callers serialize
//! runs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{store_io, StoreError};
use crate::hierarchy;
use crate::traits::{DiscussionStore, ProposalStore};
use crate::types::{DiscussionBatch, Proposal, ProposalId, ProposalMap};

pub const PROPOSALS_FILE: &str = "proposals.json";
pub const DISCUSSIONS_FILE: &str = "discussions.json";
pub const META_FILE: &str = "meta.json";

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// On-disk proposal store payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProposalStoreFile {
    /// Next numeric id to hand out.
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
}

fn first_id() -> u64 {
    1
}

/// On-disk discussion store payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiscussionStoreFile {
    #[serde(default)]
    pub batches: u64,
    #[serde(default)]
    pub edges: Vec<serde_json::Value>,
}

/// Last-sync bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaVariables {
    pub last_synced_at: DateTime<Utc>,
    /// Source revision the sync ran against, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared load / save
// ---------------------------------------------------------------------------

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| store_io(path, e))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let Some(dir) = path.parent() else {
        return Err(store_io(path, std::io::Error::other("invalid store path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| store_io(dir, e))?;

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| store_io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(store_io(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Proposal store
// ---------------------------------------------------------------------------

/// [`ProposalStore`] backed by `<data_dir>/proposals.json`.
#[derive(Debug, Clone)]
pub struct JsonProposalStore {
    path: PathBuf,
}

impl JsonProposalStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PROPOSALS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ProposalStoreFile, StoreError> {
        let mut file: ProposalStoreFile = load_json(&self.path)?;
        file.next_id = file.next_id.max(1);
        Ok(file)
    }

    pub fn save(&self, file: &ProposalStoreFile) -> Result<(), StoreError> {
        save_json(&self.path, file)
    }

    fn load_map(&self) -> Result<(u64, ProposalMap), StoreError> {
        let file = self.load()?;
        let map = file
            .proposals
            .into_iter()
            .map(|p| (p.filename.clone(), p))
            .collect();
        Ok((file.next_id, map))
    }

    fn save_map(&self, next_id: u64, map: ProposalMap) -> Result<(), StoreError> {
        self.save(&ProposalStoreFile {
            next_id,
            proposals: map.into_values().collect(),
        })
    }

    /// Insert every proposal with one load and one save.
    fn insert_all(&self, proposals: Vec<Proposal>) -> Result<Vec<Proposal>, StoreError> {
        let mut file = self.load()?;
        let incoming: HashSet<&str> = proposals.iter().map(|p| p.filename.as_str()).collect();
        file.proposals
            .retain(|p| !incoming.contains(p.filename.as_str()));

        let mut created = Vec::with_capacity(proposals.len());
        for mut proposal in proposals {
            proposal.id = Some(ProposalId(format!("p{}", file.next_id)));
            file.next_id += 1;
            created.push(proposal);
        }
        file.proposals.extend(created.iter().cloned());
        self.save(&file)?;
        Ok(created)
    }
}

impl ProposalStore for JsonProposalStore {
    fn get_all(&self) -> Result<ProposalMap, StoreError> {
        Ok(self.load_map()?.1)
    }

    fn create(&self, mut proposal: Proposal) -> Result<Proposal, StoreError> {
        let mut file = self.load()?;
        proposal.id = Some(ProposalId(format!("p{}", file.next_id)));
        file.next_id += 1;
        file.proposals.retain(|p| p.filename != proposal.filename);
        file.proposals.push(proposal.clone());
        self.save(&file)?;
        Ok(proposal)
    }

    fn create_many(&self, proposals: Vec<Proposal>) -> Vec<Result<Proposal, StoreError>> {
        if proposals.is_empty() {
            return Vec::new();
        }
        match self.insert_all(proposals) {
            Ok(created) => created.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        }
    }

    fn update(&self, id: &ProposalId, mut proposal: Proposal) -> Result<Proposal, StoreError> {
        let mut file = self.load()?;
        let Some(slot) = file.proposals.iter_mut().find(|p| p.id.as_ref() == Some(id)) else {
            return Err(StoreError::NotFound { id: id.clone() });
        };
        proposal.id = Some(id.clone());
        *slot = proposal.clone();
        self.save(&file)?;
        Ok(proposal)
    }

    fn delete_many(&self, ids: &[ProposalId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut file = self.load()?;
        file.proposals
            .retain(|p| p.id.as_ref().map_or(true, |id| !ids.contains(id)));
        self.save(&file)
    }

    fn group_by_relation(&self) -> Result<Vec<Proposal>, StoreError> {
        Ok(hierarchy::group_fathers(&self.get_all()?))
    }

    fn set_father_references(&self, ids: &[ProposalId]) -> Result<Vec<bool>, StoreError> {
        let (next_id, mut map) = self.load_map()?;
        let flags = hierarchy::link_fathers(&mut map, ids);
        self.save_map(next_id, map)?;
        Ok(flags)
    }
}

// ---------------------------------------------------------------------------
// Discussion store
// ---------------------------------------------------------------------------

/// [`DiscussionStore`] backed by `<data_dir>/discussions.json`.
#[derive(Debug, Clone)]
pub struct JsonDiscussionStore {
    path: PathBuf,
}

impl JsonDiscussionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(DISCUSSIONS_FILE),
        }
    }

    pub fn load(&self) -> Result<DiscussionStoreFile, StoreError> {
        load_json(&self.path)
    }
}

impl DiscussionStore for JsonDiscussionStore {
    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.load()?.edges.len() as u64)
    }

    fn create(&self, batch: &DiscussionBatch) -> Result<(), StoreError> {
        let mut file = self.load()?;
        file.batches += 1;
        file.edges.extend(batch.edges.iter().cloned());
        save_json(&self.path, &file)
    }
}

// ---------------------------------------------------------------------------
// Meta variables
// ---------------------------------------------------------------------------

pub fn meta_path_at(data_dir: &Path) -> PathBuf {
    data_dir.join(META_FILE)
}

/// Load `<data_dir>/meta.json`; `None` before the first sync.
pub fn load_meta_at(data_dir: &Path) -> Result<Option<MetaVariables>, StoreError> {
    let path = meta_path_at(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| store_io(&path, e))?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse { path, source })
}

pub fn save_meta_at(data_dir: &Path, meta: &MetaVariables) -> Result<(), StoreError> {
    save_json(&meta_path_at(data_dir), meta)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
