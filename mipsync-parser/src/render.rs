//! Full-text reconstruction from the node stream.
//!
//! A linear walk with a two-state machine: [`SummaryState::Outside`] until a
//! "Component Summary" heading, [`SummaryState::Inside`] until the next
//! heading at or above that heading's level.

use crate::lexer::{Node, NodeKind};

/// Heading text that opens the component summary.
pub const COMPONENT_SUMMARY: &str = "Component Summary";

/// Position of the walk relative to the component summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryState {
    #[default]
    Outside,
    Inside {
        /// Depth of the summary heading.
        depth: u8,
    },
}

impl SummaryState {
    /// State after consuming `node`.
    pub fn advance(self, node: &Node) -> Self {
        let NodeKind::Heading { depth } = node.kind else {
            return self;
        };
        if is_summary_heading(&node.text) {
            return SummaryState::Inside { depth };
        }
        match self {
            SummaryState::Inside { depth: open } if depth <= open => SummaryState::Outside,
            other => other,
        }
    }

    pub fn is_inside(self) -> bool {
        matches!(self, SummaryState::Inside { .. })
    }
}

pub fn is_summary_heading(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(COMPONENT_SUMMARY)
}

/// Render one node back to markdown.
///
/// Headings become `#… text` plus a blank line. Other nodes outside the
/// summary are emitted verbatim plus a blank line; inside the summary they
/// pass through untouched.
pub fn render_node(node: &Node, in_summary: bool) -> String {
    match node.kind {
        NodeKind::Heading { depth } => {
            format!("{} {}\n\n", "#".repeat(usize::from(depth)), node.text)
        }
        _ if in_summary => node.raw.clone(),
        NodeKind::Space => String::new(),
        _ => format!("{}\n\n", node.raw.trim_end_matches(['\n', '\r'])),
    }
}

/// Reconstruct the document from its nodes.
pub fn render(nodes: &[Node]) -> String {
    let mut state = SummaryState::default();
    let mut out = String::new();
    for node in nodes {
        state = state.advance(node);
        out.push_str(&render_node(node, state.is_inside()));
    }
    out
}
