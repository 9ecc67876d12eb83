use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use mipsync_core::config;
use mipsync_sync::Synchronizer;

use crate::error::{io_err, DaemonError};

/// Counters kept by the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub runs: u64,
    pub failures: u64,
}

/// Load the config under `home`, then run the scheduler on the current
/// thread until ctrl-c.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let config = config::load_at(home)?;
    let interval = Duration::from_secs(config.schedule.interval_secs);
    let synchronizer = Synchronizer::from_config(&config, home)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let stats = runtime.block_on(run(Arc::new(synchronizer), interval))?;
    tracing::info!(runs = stats.runs, failures = stats.failures, "daemon stopped");
    Ok(())
}

/// Run `synchronizer` every `interval` until ctrl-c.
pub async fn run(synchronizer: Arc<Synchronizer>, interval: Duration) -> Result<RunStats, DaemonError> {
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = scheduler_task(interval, move || synchronizer.run_sync(), rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, shutting down daemon");
                        let _ = shutdown.send(());
                        Ok(())
                    }
                    Err(err) => Err(DaemonError::Signal(err.to_string())),
                },
            }
        })
    };

    let (scheduler_result, signal_result) = tokio::join!(scheduler_handle, signal_handle);
    let stats = handle_join("scheduler", scheduler_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(stats)
}

/// Invoke `job` on every tick of `interval`, starting immediately.
///
/// Each run executes on the blocking pool and is awaited before the next
/// tick is taken, so runs never overlap. Ticks missed while a run is in
/// flight are skipped. A shutdown is only observed between runs.
pub async fn scheduler_task<F>(
    interval: Duration,
    job: F,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<RunStats, DaemonError>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    if interval.is_zero() {
        return Err(DaemonError::Schedule("interval must be positive".into()));
    }
    let job = Arc::new(job);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats = RunStats::default();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let job = job.clone();
                let ok = tokio::task::spawn_blocking(move || job())
                    .await
                    .map_err(|err| DaemonError::Join {
                        task: "sync run",
                        message: err.to_string(),
                    })?;
                stats.runs += 1;
                if !ok {
                    stats.failures += 1;
                    tracing::warn!(run = stats.runs, "sync run aborted");
                }
            }
        }
    }
    Ok(stats)
}

fn handle_join<T>(
    task: &'static str,
    result: Result<Result<T, DaemonError>, tokio::task::JoinError>,
) -> Result<T, DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}

/// Install the global subscriber: `RUST_LOG` filter (default `info`), JSON
/// lines when `MIPSYNC_LOG_FORMAT=json`. Records from the `log` facade are
/// bridged in.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("MIPSYNC_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let _ = if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };
}
