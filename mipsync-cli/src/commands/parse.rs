//! `mipsync parse <file>` — run the document parser on one file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use mipsync_core::{GitFile, Proposal};
use mipsync_parser::{DocumentParser, ProposalParser};
use mipsync_sync::source::content_hash;

use super::super::RuleArg;

/// Arguments for `mipsync parse`.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Markdown file to parse. Its path also decides the language.
    pub file: PathBuf,

    /// Print the full proposal as JSON.
    #[arg(long)]
    pub json: bool,

    /// Subproposal grouping rule: filename | title.
    #[arg(long, value_name = "RULE", default_value = "filename")]
    pub rule: RuleArg,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "field")]
    field: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl ParseArgs {
    pub fn run(self) -> Result<()> {
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("cannot read '{}'", self.file.display()))?;
        let raw = String::from_utf8_lossy(&bytes);
        let filename = self.file.to_string_lossy().replace('\\', "/");
        let descriptor = GitFile::new(filename, content_hash(&bytes));

        let proposal = ProposalParser::new(self.rule.into()).parse(&raw, &descriptor);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&proposal).context("failed to serialize proposal")?
            );
            return Ok(());
        }
        print_summary(&proposal);
        Ok(())
    }
}

fn print_summary(proposal: &Proposal) {
    let title = proposal.title.as_deref().unwrap_or("(untitled)");
    println!("{}", title.bold());

    let mut table = Table::new(summary_rows(proposal));
    table.with(Style::rounded());
    println!("{table}");

    if !proposal.components.is_empty() {
        println!("{}", "Components".bold());
        for component in &proposal.components {
            println!("  {}  {}", component.c_name.cyan(), component.c_title);
        }
    }
}

fn summary_rows(proposal: &Proposal) -> Vec<FieldRow> {
    let preamble = &proposal.preamble;
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();
    vec![
        FieldRow {
            field: "file",
            value: proposal.filename.clone(),
        },
        FieldRow {
            field: "language",
            value: proposal.language.to_string(),
        },
        FieldRow {
            field: "mip",
            value: preamble
                .mip
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
        },
        FieldRow {
            field: "name",
            value: or_dash(proposal.mip_name.as_deref()),
        },
        FieldRow {
            field: "status",
            value: or_dash(preamble.status.as_deref()),
        },
        FieldRow {
            field: "authors",
            value: preamble
                .author
                .as_ref()
                .map_or_else(|| "-".to_string(), |a| a.join(", ")),
        },
        FieldRow {
            field: "subproposal of",
            value: or_dash(proposal.proposal.as_deref()),
        },
        FieldRow {
            field: "components",
            value: proposal.components.len().to_string(),
        },
        FieldRow {
            field: "references",
            value: proposal.references.len().to_string(),
        },
        FieldRow {
            field: "summary",
            value: or_dash(proposal.sentence_summary.as_deref()),
        },
    ]
}
