//! `mipsync run` — one synchronization pass.

use anyhow::{bail, Context, Result};
use clap::Args;

use mipsync_core::config;
use mipsync_sync::Synchronizer;

/// Arguments for `mipsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        mipsync_daemon::init_tracing();
        let home = dirs::home_dir().context("could not determine home directory")?;
        let config =
            config::load_at(&home).context("failed to load config (run `mipsync init` first)")?;
        let synchronizer =
            Synchronizer::from_config(&config, &home).context("failed to set up synchronizer")?;

        if !synchronizer.run_sync() {
            bail!("sync run aborted");
        }
        Ok(())
    }
}
