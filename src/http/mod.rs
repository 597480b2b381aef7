//! HTTP listener lifecycle.
//!
//! The probe server moves through `Starting -> Serving -> ShuttingDown ->
//! Stopped`. Shutdown is driven by a future handed to [`ProbeServer::run`];
//! in production that is [`shutdown_signal`]. In-flight requests get a
//! bounded grace period, after which remaining connections are closed.

mod server;
mod shutdown;

pub use server::{Lifecycle, ProbeServer, ServerError};
pub use shutdown::shutdown_signal;
