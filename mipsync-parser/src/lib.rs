//! Proposal markdown parsing.
//!
//! [`ProposalParser`] lexes a document into block [`lexer::Node`]s, then
//! extracts the preamble, the component summary, the named summary
//! sections and the full-text reconstruction. Parsing never fails.

pub mod components;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod preamble;
pub mod render;

pub use components::{components_section, split_components};
pub use lexer::{BlockLexer, Lexer, Node, NodeKind};
pub use matcher::{matcher_for, FilenameRule, SubproposalMatcher, TitleRule};
pub use parser::{DocumentParser, ProposalParser};
pub use preamble::parse_preamble;
pub use render::{render, SummaryState};
