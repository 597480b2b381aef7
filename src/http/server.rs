//! Probe server startup and graceful shutdown.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum_server::Handle;
use tokio::sync::watch;

use crate::config::HttpServerConfig;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid http.host or http.port: {0}")]
    Address(String),

    #[error("Failed to bind server: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Phase of the probe server. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Starting => "starting",
            Lifecycle::Serving => "serving",
            Lifecycle::ShuttingDown => "shutting down",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// HTTP server for the probe router.
///
/// Cloning shares the underlying handle, so a clone can be kept to watch the
/// lifecycle or look up the bound address while another clone runs.
#[derive(Clone)]
pub struct ProbeServer {
    addr: SocketAddr,
    grace: Duration,
    handle: Handle,
    phase: Arc<watch::Sender<Lifecycle>>,
}

impl ProbeServer {
    pub fn new(addr: SocketAddr, grace: Duration) -> Self {
        let (phase, _) = watch::channel(Lifecycle::Starting);
        Self {
            addr,
            grace,
            handle: Handle::new(),
            phase: Arc::new(phase),
        }
    }

    pub fn from_config(config: &HttpServerConfig) -> Result<Self, ServerError> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Address(format!("{e}")))?;
        Ok(Self::new(addr, config.shutdown_grace()))
    }

    /// Subscribe to lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.phase.subscribe()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.phase.borrow()
    }

    /// Waits until the listener is bound and returns its address, or `None`
    /// if binding failed.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.listening().await
    }

    /// Serve `app` until `shutdown` resolves and the server has drained.
    ///
    /// Returns once the server is stopped. An error means the listener could
    /// not be bound or failed outside the shutdown path.
    pub async fn run<F>(self, app: Router, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(addr = %self.addr, grace = ?self.grace, "Starting probe server");

        let driver = tokio::spawn(drive_lifecycle(
            self.handle.clone(),
            self.phase.clone(),
            self.grace,
            shutdown,
        ));

        let result = axum_server::bind(self.addr)
            .handle(self.handle.clone())
            .serve(app.into_make_service())
            .await;

        let reached = self.lifecycle();
        let result = match result {
            Ok(()) => {
                if let Ok(Some(started)) = driver.await {
                    if started.elapsed() >= self.grace {
                        tracing::warn!(
                            grace = ?self.grace,
                            "Grace period elapsed, remaining connections were closed"
                        );
                    }
                }
                tracing::info!("Server gracefully stopped");
                Ok(())
            }
            Err(e) => {
                driver.abort();
                if reached == Lifecycle::Starting {
                    Err(ServerError::Bind(e))
                } else {
                    Err(ServerError::Server(e))
                }
            }
        };

        transition(&self.phase, Lifecycle::Stopped);
        result
    }
}

/// Marks the server as serving once bound, then waits for `shutdown` and
/// starts the graceful drain. Returns when the drain started, if it did.
async fn drive_lifecycle<F>(
    handle: Handle,
    phase: Arc<watch::Sender<Lifecycle>>,
    grace: Duration,
    shutdown: F,
) -> Option<Instant>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = handle.listening().await?;
    transition(&phase, Lifecycle::Serving);
    tracing::info!(%addr, "Listening for probe requests");

    shutdown.await;

    transition(&phase, Lifecycle::ShuttingDown);
    tracing::info!(
        grace = ?grace,
        connections = handle.connection_count(),
        "Shutting down server, waiting for in-flight requests"
    );
    handle.graceful_shutdown(Some(grace));
    Some(Instant::now())
}

fn transition(phase: &watch::Sender<Lifecycle>, next: Lifecycle) {
    phase.send_if_modified(|current| {
        if next > *current {
            tracing::debug!(from = %current, to = %next, "Lifecycle transition");
            *current = next;
            true
        } else {
            false
        }
    });
}
