//! Subproposal grouping rules.
//!
//! A subproposal is tied to the component it extends (`MIP4c2-SP1` belongs
//! to `MIP4c2`). Which part of the document carries that label is a matter
//! of repository convention, so the rule is a trait selected from config.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use mipsync_core::SubproposalRule;

/// Derives the grouping key of a subproposal document.
pub trait SubproposalMatcher: Send + Sync {
    /// The component label this document is a subproposal of, or `None`
    /// when it is not a subproposal.
    fn grouping_key(&self, filename: &str, title: Option<&str>) -> Option<String>;
}

fn subproposal_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*MIP(\d+)c(\d+)-SP\d+\b").expect("subproposal label pattern")
    })
}

/// `MIP4c2-SP1…` → `MIP4c2`.
fn key_from(text: &str) -> Option<String> {
    let caps = subproposal_label().captures(text)?;
    Some(format!("MIP{}c{}", &caps[1], &caps[2]))
}

/// Matches the filename stem, e.g. `MIP4/MIP4c2-Subproposals/MIP4c2-SP1.md`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameRule;

impl SubproposalMatcher for FilenameRule {
    fn grouping_key(&self, filename: &str, _title: Option<&str>) -> Option<String> {
        let stem = Path::new(filename).file_stem()?.to_str()?;
        key_from(stem)
    }
}

/// Matches the document title, e.g. `MIP4c2-SP1: Core Unit Onboarding`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleRule;

impl SubproposalMatcher for TitleRule {
    fn grouping_key(&self, _filename: &str, title: Option<&str>) -> Option<String> {
        key_from(title?)
    }
}

/// The matcher for a configured rule.
pub fn matcher_for(rule: SubproposalRule) -> Box<dyn SubproposalMatcher> {
    match rule {
        SubproposalRule::Filename => Box::new(FilenameRule),
        SubproposalRule::Title => Box::new(TitleRule),
    }
}
