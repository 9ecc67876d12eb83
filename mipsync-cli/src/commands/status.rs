//! `mipsync status` — what the local store currently holds.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use mipsync_core::{
    config,
    store::{load_meta_at, JsonDiscussionStore, JsonProposalStore},
    DiscussionStore, Language, ProposalStore,
};

/// Arguments for `mipsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let config =
            config::load_at(&home).context("failed to load config (run `mipsync init` first)")?;
        let data_dir = config.data_dir_at(&home);

        let report = build_report(&data_dir)?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&report, &config.repository.path.display().to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct StatusReport {
    proposals: usize,
    english: usize,
    spanish: usize,
    fathers: usize,
    subproposals: usize,
    unlinked_subproposals: usize,
    discussions: u64,
    last_synced_at: Option<DateTime<Utc>>,
    head: Option<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "store")]
    label: &'static str,
    #[tabled(rename = "count")]
    count: String,
}

fn build_report(data_dir: &Path) -> Result<StatusReport> {
    let proposals = JsonProposalStore::new(data_dir)
        .get_all()
        .context("failed to load proposal store")?;
    let discussions = JsonDiscussionStore::new(data_dir)
        .count()
        .context("failed to load discussion store")?;
    let meta = load_meta_at(data_dir).context("failed to load sync metadata")?;

    let subs: Vec<_> = proposals.values().filter(|p| p.is_subproposal()).collect();
    Ok(StatusReport {
        proposals: proposals.len(),
        english: proposals
            .values()
            .filter(|p| p.language == Language::English)
            .count(),
        spanish: proposals
            .values()
            .filter(|p| p.language == Language::Spanish)
            .count(),
        fathers: proposals
            .values()
            .filter(|p| p.subproposals_count > 0)
            .count(),
        subproposals: subs.len(),
        unlinked_subproposals: subs.iter().filter(|p| p.father_id.is_none()).count(),
        discussions,
        last_synced_at: meta.as_ref().map(|m| m.last_synced_at),
        head: meta.and_then(|m| m.head),
    })
}

fn print_table(report: &StatusReport, repo: &str) {
    println!("mipsync v{} | {}", env!("CARGO_PKG_VERSION"), repo);

    let rows = vec![
        StatusTableRow {
            label: "proposals",
            count: format!(
                "{} ({} en, {} es)",
                report.proposals, report.english, report.spanish
            ),
        },
        StatusTableRow {
            label: "fathers",
            count: report.fathers.to_string(),
        },
        StatusTableRow {
            label: "subproposals",
            count: report.subproposals.to_string(),
        },
        StatusTableRow {
            label: "discussions",
            count: report.discussions.to_string(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    match report.last_synced_at {
        Some(at) => {
            let head = report.head.as_deref().map(short_head).unwrap_or("-");
            println!(
                "Last sync: {} ({}) at {}",
                format_age(Utc::now(), at).green(),
                at.to_rfc3339(),
                head
            );
        }
        None => println!("Last sync: {}", "never".bright_black()),
    }
    if report.unlinked_subproposals > 0 {
        println!(
            "{}",
            format!(
                "{} subproposal(s) have no father proposal",
                report.unlinked_subproposals
            )
            .yellow()
        );
    }
}

fn short_head(head: &str) -> &str {
    head.get(..8).unwrap_or(head)
}

fn format_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
