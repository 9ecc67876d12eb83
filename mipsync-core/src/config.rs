//! YAML configuration at `~/.mipsync/config.yaml`.
//!
//! # API pattern
//!
//! Every function that touches disk has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// How the proposal repository is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A git working tree refreshed by fetch and fast-forward.
    #[default]
    Git,
    /// A plain directory; refresh is a no-op.
    Directory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Git => write!(f, "git"),
            SourceKind::Directory => write!(f, "directory"),
        }
    }
}

/// Rule deriving a subproposal's grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubproposalRule {
    /// From the filename stem (`MIP4c2-SP1.md`).
    #[default]
    Filename,
    /// From the document title (`# MIP4c2-SP1: …`).
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub kind: SourceKind,
    pub path: PathBuf,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Only proposal folders starting with this prefix are tracked.
    #[serde(default = "default_include_prefix")]
    pub include_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionsConfig {
    pub owner: String,
    pub repo: String,
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HierarchyConfig {
    #[serde(default)]
    pub subproposal_rule: SubproposalRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub repository: RepositoryConfig,
    /// Defaults to `~/.mipsync/data`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Absent: the discussion stage is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussions: Option<DiscussionsConfig>,
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// A config reading `repo_path` with every other setting defaulted.
    pub fn new(repo_path: PathBuf, kind: SourceKind) -> Self {
        Self {
            repository: RepositoryConfig {
                kind,
                path: repo_path,
                remote: default_remote(),
                branch: default_branch(),
                include_prefix: default_include_prefix(),
            },
            data_dir: None,
            discussions: None,
            hierarchy: HierarchyConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }

    /// Resolved data directory.
    pub fn data_dir_at(&self, home: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| mipsync_root(home).join("data"))
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_include_prefix() -> String {
    "MIP".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_endpoint() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_interval_secs() -> u64 {
    3600
}

// ---------------------------------------------------------------------------
// 2. Paths
// ---------------------------------------------------------------------------

/// `<home>/.mipsync/`
pub fn mipsync_root(home: &Path) -> PathBuf {
    home.join(".mipsync")
}

/// `<home>/.mipsync/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    mipsync_root(home).join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// 3. Load / save
// ---------------------------------------------------------------------------

/// Load the config.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Atomically save the config.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let root = mipsync_root(home);
    if !root.exists() {
        std::fs::create_dir_all(&root)?;
        set_dir_permissions(&root)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name(format!("{CONFIG_FILE}.tmp"));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Write a default config for `repo_path`.
///
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_at(
    home: &Path,
    repo_path: PathBuf,
    kind: SourceKind,
    branch: Option<String>,
) -> Result<Config, ConfigError> {
    if config_path_at(home).exists() {
        return load_at(home);
    }
    let mut config = Config::new(repo_path, kind);
    if let Some(branch) = branch {
        config.repository.branch = branch;
    }
    save_at(home, &config)?;
    Ok(config)
}

/// `init_at` convenience wrapper.
pub fn init(repo_path: PathBuf, kind: SourceKind, branch: Option<String>) -> Result<Config, ConfigError> {
    init_at(&home()?, repo_path, kind, branch)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(config_path_at(home.path()).ends_with(".mipsync/config.yaml"));
    }

    #[test]
    fn minimal_yaml_takes_defaults() {
        let yaml = "repository:\n  path: /srv/mips\n";
        let config: Config = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.repository.kind, SourceKind::Git);
        assert_eq!(config.repository.remote, "origin");
        assert_eq!(config.repository.branch, "master");
        assert_eq!(config.repository.include_prefix, "MIP");
        assert!(config.discussions.is_none());
        assert_eq!(config.hierarchy.subproposal_rule, SubproposalRule::Filename);
        assert_eq!(config.schedule.interval_secs, 3600);
    }

    #[rstest]
    #[case::git("git", "filename", SourceKind::Git, SubproposalRule::Filename)]
    #[case::directory("directory", "filename", SourceKind::Directory, SubproposalRule::Filename)]
    #[case::title_rule("git", "title", SourceKind::Git, SubproposalRule::Title)]
    fn yaml_selects_kind_and_rule(
        #[case] kind: &str,
        #[case] rule: &str,
        #[case] expected_kind: SourceKind,
        #[case] expected_rule: SubproposalRule,
    ) {
        let yaml = format!(
            "repository:\n  path: /srv/mips\n  kind: {kind}\nhierarchy:\n  subproposal_rule: {rule}\n"
        );
        let config: Config = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(config.repository.kind, expected_kind);
        assert_eq!(config.hierarchy.subproposal_rule, expected_rule);
    }

    #[rstest]
    #[case::unknown_kind("repository:\n  path: /srv/mips\n  kind: svn\n")]
    #[case::unknown_rule("repository:\n  path: /srv/mips\nhierarchy:\n  subproposal_rule: path\n")]
    #[case::missing_path("repository:\n  kind: git\n")]
    fn invalid_yaml_is_rejected(#[case] yaml: &str) {
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn discussions_section_defaults() {
        let yaml = "repository:\n  path: /srv/mips\ndiscussions:\n  owner: makerdao\n  repo: mips\n";
        let config: Config = serde_yaml::from_str(yaml).expect("parse");
        let d = config.discussions.expect("discussions");
        assert_eq!(d.token_env, "GITHUB_TOKEN");
        assert_eq!(d.page_size, 100);
        assert_eq!(d.endpoint, "https://api.github.com/graphql");
    }

    #[test]
    fn data_dir_defaults_under_root() {
        let home = TempDir::new().expect("tempdir");
        let config = Config::new(PathBuf::from("/srv/mips"), SourceKind::Directory);
        assert!(config.data_dir_at(home.path()).ends_with(".mipsync/data"));
    }

    #[test]
    fn init_is_idempotent() {
        let home = TempDir::new().expect("tempdir");
        let first = init_at(
            home.path(),
            PathBuf::from("/srv/mips"),
            SourceKind::Git,
            Some("main".into()),
        )
        .expect("init");
        assert_eq!(first.repository.branch, "main");

        let second = init_at(home.path(), PathBuf::from("/elsewhere"), SourceKind::Directory, None)
            .expect("init again");
        assert_eq!(second, first);
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
