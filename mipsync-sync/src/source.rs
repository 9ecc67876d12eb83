//! Concrete [`DocumentSource`]s: a git working tree and a plain directory.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use git2::{build::CheckoutBuilder, FetchOptions, IndexEntry, RemoteCallbacks, Repository};
use sha2::{Digest, Sha256};

use mipsync_core::{
    store::{save_meta_at, MetaVariables},
    DocumentSource, GitFile, SourceError,
};

// ---------------------------------------------------------------------------
// Tracked-file filter
// ---------------------------------------------------------------------------

/// Whether `filename` is a proposal document.
///
/// Markdown files whose proposal folder starts with `prefix`. The folder is
/// the first path segment, or the one after `I18N/<code>/` for translations.
pub fn is_tracked(filename: &str, prefix: &str) -> bool {
    let is_markdown = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"));
    if !is_markdown {
        return false;
    }
    let parts: Vec<&str> = filename.split('/').collect();
    let folder = match parts.as_slice() {
        [root, _code, folder, _, ..] if root.eq_ignore_ascii_case("i18n") => folder,
        [folder, _, ..] => folder,
        _ => return false,
    };
    folder
        .to_ascii_lowercase()
        .starts_with(&prefix.to_ascii_lowercase())
}

/// SHA-256 hex digest of `content` with CRLF normalised to LF.
pub fn content_hash(content: &[u8]) -> String {
    let mut normalized = Vec::with_capacity(content.len());
    let mut iter = content.iter().peekable();
    while let Some(byte) = iter.next() {
        if *byte == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        normalized.push(*byte);
    }
    let mut hasher = Sha256::new();
    hasher.update(&normalized);
    hex::encode(hasher.finalize())
}

fn source_io(path: impl Into<PathBuf>, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.into(),
        source,
    }
}

fn read_in(root: &Path, filename: &str) -> Result<String, SourceError> {
    let relative = Path::new(filename);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(source_io(
            relative,
            std::io::Error::other("path escapes the repository"),
        ));
    }
    let path = root.join(relative);
    std::fs::read_to_string(&path).map_err(|e| source_io(&path, e))
}

// ---------------------------------------------------------------------------
// Git working tree
// ---------------------------------------------------------------------------

/// A git working tree refreshed by fetch plus fast-forward; hashes are
/// blob ids from the index.
#[derive(Debug, Clone)]
pub struct GitDocumentSource {
    repo: PathBuf,
    data_dir: PathBuf,
    include_prefix: String,
}

impl GitDocumentSource {
    pub fn new(repo: PathBuf, data_dir: PathBuf, include_prefix: impl Into<String>) -> Self {
        Self {
            repo,
            data_dir,
            include_prefix: include_prefix.into(),
        }
    }

    fn open(&self) -> Result<Repository, git2::Error> {
        Repository::open(&self.repo)
    }

    fn head(&self) -> Option<String> {
        let repo = self.open().ok()?;
        let head = repo.head().ok()?;
        head.target().map(|oid| oid.to_string())
    }

    /// Fetch `branch` from `remote_name` and fast-forward the local branch
    /// and working tree to it.
    fn fetch_and_fast_forward(&self, remote_name: &str, branch: &str) -> Result<(), git2::Error> {
        let repo = self.open()?;
        let mut remote = repo.find_remote(remote_name)?;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|_stats| true);
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        remote.fetch(&[branch], Some(&mut fetch_options), None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let incoming = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&incoming])?;
        if analysis.is_up_to_date() {
            tracing::debug!("{remote_name}/{branch} already up to date");
            return Ok(());
        }
        if !analysis.is_fast_forward() && !analysis.is_unborn() {
            return Err(git2::Error::from_str(
                "local branch has diverged and cannot be fast-forwarded",
            ));
        }

        let refname = format!("refs/heads/{branch}");
        let message = format!("mipsync: fast-forward to {}", incoming.id());
        match repo.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(incoming.id(), &message)?;
            }
            Err(_) => {
                repo.reference(&refname, incoming.id(), true, &message)?;
            }
        }
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        Ok(())
    }
}

/// Merge stage of an index entry; non-zero while a conflict is unresolved.
fn index_stage(entry: &IndexEntry) -> u16 {
    (entry.flags >> 12) & 0x3
}

impl DocumentSource for GitDocumentSource {
    fn pull(&self, remote: &str, branch: &str) -> Result<(), SourceError> {
        tracing::info!("fetching {remote}/{branch} into {}", self.repo.display());
        self.fetch_and_fast_forward(remote, branch)
            .map_err(|e| SourceError::Transport {
                remote: remote.to_string(),
                branch: branch.to_string(),
                message: e.message().to_string(),
            })
    }

    fn list_files(&self) -> Result<Vec<GitFile>, SourceError> {
        let repo = self.open()?;
        let index = repo.index()?;
        Ok(index
            .iter()
            .filter(|entry| index_stage(entry) == 0)
            .filter_map(|entry| {
                let path = String::from_utf8_lossy(&entry.path).into_owned();
                is_tracked(&path, &self.include_prefix)
                    .then(|| GitFile::new(path, entry.id.to_string()))
            })
            .collect())
    }

    fn read_file(&self, filename: &str) -> Result<String, SourceError> {
        read_in(&self.repo, filename)
    }

    fn persist_meta_variables(&self) -> Result<(), SourceError> {
        let meta = MetaVariables {
            last_synced_at: Utc::now(),
            head: self.head(),
        };
        save_meta_at(&self.data_dir, &meta)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Plain directory
// ---------------------------------------------------------------------------

/// A directory of markdown files; refreshing is a no-op.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentSource {
    root: PathBuf,
    data_dir: PathBuf,
    include_prefix: String,
}

impl DirectoryDocumentSource {
    pub fn new(root: PathBuf, data_dir: PathBuf, include_prefix: impl Into<String>) -> Self {
        Self {
            root,
            data_dir,
            include_prefix: include_prefix.into(),
        }
    }
}

impl DocumentSource for DirectoryDocumentSource {
    fn pull(&self, _remote: &str, _branch: &str) -> Result<(), SourceError> {
        tracing::debug!("directory source: nothing to pull");
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<GitFile>, SourceError> {
        let mut files = Vec::new();
        for path in collect_files(&self.root)? {
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let filename = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !is_tracked(&filename, &self.include_prefix) {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| source_io(&path, e))?;
            files.push(GitFile::new(filename, content_hash(&bytes)));
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    fn read_file(&self, filename: &str) -> Result<String, SourceError> {
        read_in(&self.root, filename)
    }

    fn persist_meta_variables(&self) -> Result<(), SourceError> {
        let meta = MetaVariables {
            last_synced_at: Utc::now(),
            head: None,
        };
        save_meta_at(&self.data_dir, &meta)?;
        Ok(())
    }
}

/// Every regular file under `root`, skipping hidden entries.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut dirs = vec![root.to_path_buf()];
    let mut files = Vec::new();
    let mut cursor = 0;
    while cursor < dirs.len() {
        let current = dirs[cursor].clone();
        cursor += 1;
        let entries = std::fs::read_dir(&current).map_err(|e| source_io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| source_io(&current, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let ty = entry.file_type().map_err(|e| source_io(entry.path(), e))?;
            if ty.is_dir() {
                dirs.push(entry.path());
            } else if ty.is_file() {
                files.push(entry.path());
            }
        }
    }
    Ok(files)
}
