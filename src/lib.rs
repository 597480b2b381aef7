//! swarm-probe: HTTP liveness probe for Docker Swarm nodes.
//!
//! Serves `GET /ishealthy`, answering 204 when the local Docker daemon reports
//! this node as an active swarm member, 503 when it does not, and 500 when the
//! daemon cannot be queried.

pub mod config;
pub mod docker;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ProbeError;
pub use health::{check_node, is_healthy, ClusterStatus, LocalNodeState, StatusSource};
