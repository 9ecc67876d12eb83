//! mipsync — proposal repository sync CLI.
//!
//! # Usage
//!
//! ```text
//! mipsync init [--repo <path>] [--kind git|directory] [--branch <name>]
//! mipsync run
//! mipsync parse <file> [--json] [--rule filename|title]
//! mipsync status [--json]
//! mipsync daemon
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    daemon::DaemonArgs, init::InitArgs, parse::ParseArgs, run::RunArgs, status::StatusArgs,
};
use mipsync_core::{SourceKind, SubproposalRule};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mipsync",
    version,
    about = "Mirror a repository of improvement proposals into a local store",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default configuration.
    Init(InitArgs),

    /// Run one synchronization pass.
    Run(RunArgs),

    /// Parse a single markdown document and print the result.
    Parse(ParseArgs),

    /// Show what the local store holds.
    Status(StatusArgs),

    /// Run the periodic scheduler in the foreground.
    Daemon(DaemonArgs),
}

// ---------------------------------------------------------------------------
// Shared arguments — parsed from CLI strings, convert to core types
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `SourceKind` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct SourceKindArg(pub SourceKind);

impl FromStr for SourceKindArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "git" => Ok(Self(SourceKind::Git)),
            "directory" | "dir" => Ok(Self(SourceKind::Directory)),
            other => Err(format!(
                "unknown source kind '{other}'; expected: git, directory"
            )),
        }
    }
}

impl fmt::Display for SourceKindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<SourceKindArg> for SourceKind {
    fn from(k: SourceKindArg) -> Self {
        k.0
    }
}

/// Thin wrapper so clap can parse `SubproposalRule` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct RuleArg(pub SubproposalRule);

impl FromStr for RuleArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "filename" => Ok(Self(SubproposalRule::Filename)),
            "title" => Ok(Self(SubproposalRule::Title)),
            other => Err(format!(
                "unknown subproposal rule '{other}'; expected: filename, title"
            )),
        }
    }
}

impl From<RuleArg> for SubproposalRule {
    fn from(r: RuleArg) -> Self {
        r.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Run(args) => args.run(),
        Commands::Parse(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Daemon(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_arg_accepts_known_values() {
        assert_eq!(
            "Directory".parse::<SourceKindArg>().unwrap().0,
            SourceKind::Directory
        );
        assert_eq!("git".parse::<SourceKindArg>().unwrap().0, SourceKind::Git);
        assert!("svn".parse::<SourceKindArg>().is_err());
    }

    #[test]
    fn rule_arg_accepts_known_values() {
        assert_eq!(
            "TITLE".parse::<RuleArg>().unwrap().0,
            SubproposalRule::Title
        );
        assert!("path".parse::<RuleArg>().is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
