use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use konnect_core::CancelToken;
use konnect_ports::ClientConfig;
use konnect_sync::{pipeline, ReconcileReport, SyncError};

use crate::error::{io_err, DaemonError};

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Records emitted through the `log` facade are bridged as well.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// How a control loop ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub passes: u64,
    /// Stopped by a shutdown request rather than by running out of passes.
    pub shutdown: bool,
    pub last: Option<ReconcileReport>,
}

/// Repeats a blocking reconciliation pass every `interval`.
///
/// A zero interval runs exactly one pass. A failed pass ends the loop with
/// its error. A shutdown request cancels the running pass, or ends the
/// loop immediately when it arrives between passes. Dropping every shutdown
/// sender counts as a shutdown request.
pub struct ControlLoop<F> {
    pass: Arc<F>,
    interval: Duration,
}

impl<F> ControlLoop<F>
where
    F: Fn(&CancelToken) -> Result<ReconcileReport, SyncError> + Send + Sync + 'static,
{
    pub fn new(interval: Duration, pass: F) -> Self {
        Self {
            pass: Arc::new(pass),
            interval,
        }
    }

    pub async fn run<R>(
        &self,
        mut shutdown: broadcast::Receiver<()>,
        mut on_report: R,
    ) -> Result<LoopSummary, DaemonError>
    where
        R: FnMut(&ReconcileReport),
    {
        let mut summary = LoopSummary {
            passes: 0,
            shutdown: false,
            last: None,
        };

        loop {
            let cx = CancelToken::new();
            let pass = Arc::clone(&self.pass);
            let pass_cx = cx.clone();
            let mut handle = tokio::task::spawn_blocking(move || pass(&pass_cx));

            let finished = tokio::select! {
                joined = &mut handle => Some(joined),
                _ = shutdown.recv() => None,
            };
            let joined = match finished {
                Some(joined) => joined,
                None => {
                    tracing::info!("shutdown requested, cancelling the running pass");
                    summary.shutdown = true;
                    cx.cancel();
                    handle.await
                }
            };
            let report = joined.map_err(|err| DaemonError::Join {
                task: "reconcile",
                detail: err.to_string(),
            })??;

            summary.passes += 1;
            on_report(&report);
            summary.last = Some(report);

            if summary.shutdown || self.interval.is_zero() {
                return Ok(summary);
            }

            tracing::info!(
                "next reconciliation pass in {}s",
                self.interval.as_secs()
            );
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!("shutdown requested, stopping control loop");
                    summary.shutdown = true;
                    return Ok(summary);
                }
            }
        }
    }
}

/// Build a runtime and block the current thread until the loop exits.
pub fn start_blocking<R>(
    manifest: PathBuf,
    config: ClientConfig,
    interval: Duration,
    on_report: R,
) -> Result<LoopSummary, DaemonError>
where
    R: FnMut(&ReconcileReport),
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(manifest, config, interval, on_report))
}

/// Reconcile `manifest` against the production clients until the loop ends.
/// Ctrl-C requests shutdown.
pub async fn run<R>(
    manifest: PathBuf,
    config: ClientConfig,
    interval: Duration,
    on_report: R,
) -> Result<LoopSummary, DaemonError>
where
    R: FnMut(&ReconcileReport),
{
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);

    let signal_task = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, shutting down");
                        let _ = shutdown.send(());
                        Ok(())
                    }
                    Err(err) => Err(DaemonError::Signal(err.to_string())),
                },
            }
        })
    };

    tracing::info!(
        manifest = %manifest.display(),
        interval_s = interval.as_secs(),
        "control loop starting"
    );
    let control = ControlLoop::new(interval, move |cx: &CancelToken| {
        pipeline::run(&manifest, &config, cx)
    });
    let result = control.run(shutdown_rx, on_report).await;

    let _ = shutdown_tx.send(());
    if let Err(err) = handle_join("ctrl-c", signal_task).await {
        tracing::warn!("{err}");
    }
    result
}

async fn handle_join(
    task: &'static str,
    handle: JoinHandle<Result<(), DaemonError>>,
) -> Result<(), DaemonError> {
    handle.await.map_err(|err| DaemonError::Join {
        task,
        detail: err.to_string(),
    })?
}
