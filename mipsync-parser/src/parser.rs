//! Markdown document → [`Proposal`].

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use mipsync_core::{GitFile, Proposal, Reference, SubproposalRule};

use crate::components::{components_section, split_components};
use crate::lexer::{BlockLexer, Lexer, Node, NodeKind};
use crate::matcher::{matcher_for, FilenameRule, SubproposalMatcher};
use crate::preamble::parse_preamble;
use crate::render::render;

/// Turns raw document text into a structured record.
///
/// Implementations are total: malformed input degrades to absent fields.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, raw: &str, descriptor: &GitFile) -> Proposal;
}

/// The proposal parser: lexer + section extraction + subproposal rule.
pub struct ProposalParser {
    lexer: Box<dyn Lexer>,
    matcher: Box<dyn SubproposalMatcher>,
}

impl Default for ProposalParser {
    fn default() -> Self {
        Self {
            lexer: Box::new(BlockLexer),
            matcher: Box::new(FilenameRule),
        }
    }
}

impl ProposalParser {
    pub fn new(rule: SubproposalRule) -> Self {
        Self::default().with_matcher(matcher_for(rule))
    }

    pub fn with_lexer(mut self, lexer: Box<dyn Lexer>) -> Self {
        self.lexer = lexer;
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn SubproposalMatcher>) -> Self {
        self.matcher = matcher;
        self
    }
}

impl DocumentParser for ProposalParser {
    fn parse(&self, raw: &str, descriptor: &GitFile) -> Proposal {
        let mut proposal = Proposal::from_descriptor(descriptor);
        proposal.file = raw.to_string();
        if raw.trim().is_empty() {
            return proposal;
        }

        let nodes = self.lexer.lex(raw);
        let rendered = render(&nodes);

        proposal.title = title(&nodes);
        proposal.mip_name = mip_name(proposal.title.as_deref(), &descriptor.filename);
        proposal.preamble = preamble_block(&nodes)
            .map(parse_preamble)
            .unwrap_or_default();
        proposal.sentence_summary = section_text(&nodes, "Sentence Summary");
        proposal.paragraph_summary = section_text(&nodes, "Paragraph Summary");
        proposal.references = section_nodes(&nodes, "References")
            .map(references)
            .unwrap_or_default();
        proposal.components = split_components(components_section(&rendered));
        proposal.proposal = self
            .matcher
            .grouping_key(&descriptor.filename, proposal.title.as_deref());
        proposal.rendered = rendered;
        proposal
    }
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

/// Text of the first level-1 heading.
fn title(nodes: &[Node]) -> Option<String> {
    nodes
        .iter()
        .find(|n| n.heading_depth() == Some(1))
        .map(|n| n.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `"MIP0: The Framework"` → `"MIP0"`; otherwise the filename stem.
fn mip_name(title: Option<&str>, filename: &str) -> Option<String> {
    title
        .and_then(|t| t.split_once(':'))
        .map(|(name, _)| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| {
            Path::new(filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
}

fn is_named(node: &Node, name: &str) -> bool {
    node.heading_depth().is_some()
        && node
            .text
            .trim()
            .trim_end_matches(':')
            .trim()
            .eq_ignore_ascii_case(name)
}

/// Nodes under the heading `name`, up to the next heading at or above its
/// level.
fn section_nodes<'a>(nodes: &'a [Node], name: &str) -> Option<&'a [Node]> {
    let at = nodes.iter().position(|n| is_named(n, name))?;
    let depth = nodes[at].heading_depth()?;
    let body = &nodes[at + 1..];
    let end = body
        .iter()
        .position(|n| n.heading_depth().is_some_and(|d| d <= depth))
        .unwrap_or(body.len());
    Some(&body[..end])
}

fn section_text(nodes: &[Node], name: &str) -> Option<String> {
    let raw: String = section_nodes(nodes, name)?
        .iter()
        .map(|n| n.raw.as_str())
        .collect();
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// The block holding `Key: value` lines: the first block under a
/// `Preamble` heading, else the first non-heading block of the document.
/// Fenced blocks contribute their inner text.
fn preamble_block(nodes: &[Node]) -> Option<&str> {
    let candidates = match section_nodes(nodes, "Preamble") {
        Some(section) => section,
        None => nodes,
    };
    candidates
        .iter()
        .find(|n| !n.is_space() && n.heading_depth().is_none())
        .map(|n| match n.kind {
            NodeKind::Code => n.text.as_str(),
            _ => n.raw.as_str(),
        })
}

fn link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\[([^\]]+)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#).expect("link pattern")
    })
}

fn references(section: &[Node]) -> Vec<Reference> {
    section
        .iter()
        .flat_map(|node| {
            link_pattern()
                .captures_iter(&node.raw)
                .map(|caps| Reference {
                    name: caps[1].trim().to_string(),
                    link: caps[2].to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
