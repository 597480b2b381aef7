//! Docker daemon status source.
//!
//! Reads swarm membership from the local daemon's `GET /info` endpoint via
//! bollard. The client is created on first use and reused for every later
//! request; a failed creation is not remembered, so the next probe tries again.

use async_trait::async_trait;
use bollard::models::{LocalNodeState as DockerNodeState, SystemInfo};
use bollard::Docker;
use tokio::sync::OnceCell;

use crate::config::DockerConfig;
use crate::error::ProbeError;
use crate::health::{ClusterStatus, LocalNodeState, StatusSource};

/// [`StatusSource`] backed by the local Docker daemon.
pub struct DockerStatusSource {
    config: DockerConfig,
    client: OnceCell<Docker>,
}

impl DockerStatusSource {
    pub fn new(config: DockerConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Docker, ProbeError> {
        self.client
            .get_or_try_init(|| async { self.connect() })
            .await
    }

    fn connect(&self) -> Result<Docker, ProbeError> {
        let timeout_secs = self.config.request_timeout_seconds;
        let docker = match &self.config.socket {
            Some(socket) => {
                Docker::connect_with_socket(socket, timeout_secs, bollard::API_DEFAULT_VERSION)
            }
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| {
            tracing::error!(error = %e, "Unable to create docker client");
            ProbeError::DaemonUnavailable(e.to_string())
        })?;

        tracing::debug!(socket = ?self.config.socket, "Created docker client");
        Ok(docker)
    }
}

#[async_trait]
impl StatusSource for DockerStatusSource {
    async fn fetch_status(&self) -> Result<ClusterStatus, ProbeError> {
        let info = self.client().await?.info().await?;
        Ok(cluster_status(info))
    }
}

impl Drop for DockerStatusSource {
    fn drop(&mut self) {
        if self.client.initialized() {
            tracing::info!("Docker client closed");
        }
    }
}

/// Extract swarm membership from a system info response. Missing fields
/// become empty IDs and [`LocalNodeState::Unknown`].
fn cluster_status(info: SystemInfo) -> ClusterStatus {
    let Some(swarm) = info.swarm else {
        return ClusterStatus::default();
    };

    ClusterStatus {
        node_id: swarm.node_id.unwrap_or_default(),
        cluster_id: swarm.cluster.and_then(|c| c.id).unwrap_or_default(),
        local_node_state: swarm
            .local_node_state
            .map(node_state)
            .unwrap_or_default(),
    }
}

fn node_state(state: DockerNodeState) -> LocalNodeState {
    match state {
        DockerNodeState::INACTIVE => LocalNodeState::Inactive,
        DockerNodeState::PENDING => LocalNodeState::Pending,
        DockerNodeState::ACTIVE => LocalNodeState::Active,
        DockerNodeState::ERROR => LocalNodeState::Error,
        DockerNodeState::LOCKED => LocalNodeState::Locked,
        DockerNodeState::EMPTY => LocalNodeState::Unknown,
    }
}
