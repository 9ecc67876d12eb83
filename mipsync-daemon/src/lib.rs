//! Scheduled sync runner: one run per interval, never overlapping, until
//! ctrl-c.

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{init_tracing, run, scheduler_task, start_blocking, RunStats};
