//! Control loop: run reconciliation once, or on a fixed cadence until
//! shutdown.

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{init_tracing, run, start_blocking, ControlLoop, LogFormat, LoopSummary};
