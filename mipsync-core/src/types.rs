//! Domain types for proposal synchronization.
//!
//! All types are serializable via serde; the JSON stores persist
//! [`Proposal`] as-is.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Store-assigned identifier of a persisted [`Proposal`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(pub String);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProposalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Language of a proposal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    /// Maps a two-letter translation folder code (`ES`, `en`, …) to a language.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Language::English),
            "es" => Some(Language::Spanish),
            _ => None,
        }
    }

    /// Infers the language from a repository-relative path.
    ///
    /// Translations live under `I18N/<code>/…`; anything else is English.
    pub fn from_path(filename: &str) -> Self {
        let mut parts = filename.split('/');
        match (parts.next(), parts.next()) {
            (Some(root), Some(code)) if root.eq_ignore_ascii_case("i18n") => {
                Language::from_code(code).unwrap_or_default()
            }
            _ => Language::English,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::Spanish => write!(f, "es"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source descriptors
// ---------------------------------------------------------------------------

/// A tracked file observed in the source tree. Rebuilt on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFile {
    /// Repository-relative path; unique key.
    pub filename: String,
    /// Deterministic digest of the file bytes.
    pub hash: String,
    pub language: Language,
}

impl GitFile {
    pub fn new(filename: impl Into<String>, hash: impl Into<String>) -> Self {
        let filename = filename.into();
        let language = Language::from_path(&filename);
        Self {
            filename,
            hash: hash.into(),
            language,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsed content
// ---------------------------------------------------------------------------

/// Leading metadata block of a proposal. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preamble {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_proposed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_ratified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratification_poll_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Preamble {
    /// `true` when no key was recognised.
    pub fn is_empty(&self) -> bool {
        self == &Preamble::default()
    }
}

/// One labelled entry of a document's Component Summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Label token, e.g. `MIP0c1`.
    pub c_name: String,
    pub c_title: String,
    pub c_body: String,
}

/// A markdown link found in the References section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub link: String,
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// The persisted unit: one parsed markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Proposal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProposalId>,
    pub filename: String,
    pub hash: String,
    #[serde(default)]
    pub language: Language,
    /// Raw markdown text.
    #[serde(default)]
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mip_name: Option<String>,
    #[serde(default)]
    pub preamble: Preamble,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_summary: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub references: Vec<Reference>,
    /// Full-text reconstruction from the token stream.
    #[serde(default)]
    pub rendered: String,
    /// Grouping key when this document is a subproposal (e.g. `MIP4c2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<String>,
    /// Weak back-reference to the father proposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<ProposalId>,
    #[serde(default)]
    pub subproposals_count: u32,
}

impl Proposal {
    /// An unparsed proposal carrying only the source descriptor.
    pub fn from_descriptor(descriptor: &GitFile) -> Self {
        Self {
            filename: descriptor.filename.clone(),
            hash: descriptor.hash.clone(),
            language: descriptor.language,
            ..Default::default()
        }
    }

    /// The sequence number from the preamble.
    pub fn mip(&self) -> Option<u32> {
        self.preamble.mip
    }

    pub fn is_subproposal(&self) -> bool {
        self.proposal.is_some()
    }

    pub fn has_component(&self, label: &str) -> bool {
        self.components.iter().any(|c| c.c_name == label)
    }
}

/// Stored proposals keyed by filename.
pub type ProposalMap = BTreeMap<String, Proposal>;

// ---------------------------------------------------------------------------
// Discussions
// ---------------------------------------------------------------------------

/// One page of the external discussion feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DiscussionBatch {
    /// Opaque edge payloads, in feed order.
    pub edges: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
    /// Present on the first page only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SynchronizeResult {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl SynchronizeResult {
    pub fn is_noop(&self) -> bool {
        self.creates == 0 && self.updates == 0 && self.deletes == 0
    }
}

impl fmt::Display for SynchronizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted",
            self.creates, self.updates, self.deletes
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
