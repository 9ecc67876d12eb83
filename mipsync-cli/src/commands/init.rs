//! `mipsync init [--repo <path>] [--kind git|directory] [--branch <name>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mipsync_core::config;

use super::super::SourceKindArg;

/// Write `~/.mipsync/config.yaml`; an existing file is left untouched.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to the proposal repository (defaults to the current directory).
    #[arg(long, short = 'r')]
    pub repo: Option<PathBuf>,

    /// Repository kind: git | directory.
    #[arg(long, short = 'k', value_name = "KIND", default_value = "git")]
    pub kind: SourceKindArg,

    /// Branch to pull (git only).
    #[arg(long, short = 'b')]
    pub branch: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let repo = match self.repo {
            Some(path) => path,
            None => std::env::current_dir().context("cannot read current directory")?,
        };
        let repo = repo
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", repo.display()))?;

        let existed = config::config_path_at(&home).exists();
        let config = config::init_at(&home, repo, self.kind.into(), self.branch)
            .context("failed to write configuration")?;

        if existed {
            println!(
                "· Configuration already present at {}",
                config::config_path_at(&home).display()
            );
        } else {
            println!(
                "✓ Tracking {} '{}' ({}/{})",
                config.repository.kind,
                config.repository.path.display(),
                config.repository.remote,
                config.repository.branch
            );
            println!("  Saved to: {}", config::config_path_at(&home).display());
        }
        Ok(())
    }
}
