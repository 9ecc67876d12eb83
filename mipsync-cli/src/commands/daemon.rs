//! `mipsync daemon` — periodic sync in the foreground.

use anyhow::{Context, Result};
use clap::Args;

use mipsync_daemon::start_blocking;

/// Arguments for `mipsync daemon`.
#[derive(Args, Debug)]
pub struct DaemonArgs {}

impl DaemonArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        start_blocking(&home).context("daemon exited with error")
    }
}
