//! Swarm membership health evaluation.
//!
//! A node is healthy when the daemon reports it as an active member of a
//! swarm: it has a node ID, belongs to a cluster, and its local node state is
//! `active`. The evaluation itself never fails; errors only come from fetching
//! the status snapshot through a [`StatusSource`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProbeError;

/// Local swarm state of the node as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalNodeState {
    Inactive,
    Pending,
    Active,
    Error,
    Locked,
    /// Empty or absent state
    #[default]
    Unknown,
}

impl fmt::Display for LocalNodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocalNodeState::Inactive => "inactive",
            LocalNodeState::Pending => "pending",
            LocalNodeState::Active => "active",
            LocalNodeState::Error => "error",
            LocalNodeState::Locked => "locked",
            LocalNodeState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of the daemon's swarm membership, taken once per probe request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStatus {
    pub node_id: String,
    pub cluster_id: String,
    pub local_node_state: LocalNodeState,
}

/// Anything that can produce a fresh [`ClusterStatus`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<ClusterStatus, ProbeError>;
}

/// Returns true iff the node has an ID, belongs to a cluster, and is active.
pub fn is_healthy(status: &ClusterStatus) -> bool {
    !status.node_id.is_empty()
        && !status.cluster_id.is_empty()
        && status.local_node_state == LocalNodeState::Active
}

/// Fetch one snapshot from `source`, bounded by `timeout`, and evaluate it.
///
/// Exactly one fetch attempt is made. A failed or timed out fetch is returned
/// as an error and the snapshot predicate is not consulted.
pub async fn check_node(source: &dyn StatusSource, timeout: Duration) -> Result<bool, ProbeError> {
    let status = match tokio::time::timeout(timeout, source.fetch_status()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Unable to get docker information, is docker running?");
            return Err(e);
        }
        Err(_) => {
            tracing::error!(timeout = ?timeout, "Docker information request timed out");
            return Err(ProbeError::Timeout(timeout));
        }
    };

    if is_healthy(&status) {
        tracing::info!(
            cluster_id = %status.cluster_id,
            node_id = %status.node_id,
            state = %status.local_node_state,
            "Node is an active swarm member"
        );
        Ok(true)
    } else {
        tracing::info!(state = %status.local_node_state, "Node is not an active swarm member");
        Ok(false)
    }
}
