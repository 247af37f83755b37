//! Orchestrates long-running processes with coordinated graceful shutdown.
//!
//! Every process shares one [`CancellationToken`]. The first process to fail
//! (or an OS signal) cancels the token; the rest are expected to observe it
//! and wind down. Closers run afterwards, each under its own timeout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_CLOSER_TIMEOUT: Duration = Duration::from_secs(10);

type ProcessFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;
type Process = Box<dyn FnOnce(CancellationToken) -> ProcessFuture + Send>;
type Closer = Box<dyn FnOnce() -> ProcessFuture + Send>;

/// Builder for a set of named processes plus cleanup closers.
pub struct Runner {
    processes: Vec<(String, Process)>,
    closers: Vec<(String, Closer)>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: DEFAULT_CLOSER_TIMEOUT,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Registers a long-running process. The process receives the shared
    /// cancellation token and should return once it is cancelled.
    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.processes
            .push((name.into(), Box::new(move |token| Box::pin(process(token)))));
        self
    }

    /// Registers a cleanup function that runs after all processes have stopped.
    pub fn with_closer<F, Fut>(mut self, name: impl Into<String>, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers
            .push((name.into(), Box::new(move || Box::pin(closer()))));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Uses an externally created token, letting callers trigger shutdown
    /// themselves or share the token with components built before the runner.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs every process to completion. Returns the first process error, if
    /// any. Signals (SIGINT/SIGTERM) trigger a clean shutdown with `Ok(())`.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let token = self.cancellation_token;
        spawn_signal_handlers(token.clone());

        let mut join_set: JoinSet<(String, Result<(), anyhow::Error>)> = JoinSet::new();
        for (name, process) in self.processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                let result = process(process_token).await;
                (name, result)
            });
        }

        let mut first_error: Option<anyhow::Error> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    info!(process = %name, "process finished");
                }
                Ok((name, Err(err))) => {
                    error!(process = %name, error = %err, "process failed");
                    if first_error.is_none() {
                        first_error = Some(err.context(format!("process {name} failed")));
                    }
                    token.cancel();
                }
                Err(join_err) => {
                    error!(error = %join_err, "process panicked");
                    if first_error.is_none() {
                        first_error = Some(anyhow!(join_err).context("process panicked"));
                    }
                    token.cancel();
                }
            }
        }
        join_set.shutdown().await;

        for (name, closer) in self.closers {
            match tokio::time::timeout(self.closer_timeout, closer()).await {
                Ok(Ok(())) => info!(closer = %name, "closer finished"),
                Ok(Err(err)) => warn!(closer = %name, error = %err, "closer failed"),
                Err(_) => warn!(closer = %name, "closer timed out"),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to install ctrl-c handler");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => error!(error = %err, "failed to install sigterm handler"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received sigint, shutting down"),
            _ = terminate => info!("received sigterm, shutting down"),
        }
        token.cancel();
    });
}
