//! End-to-end probe tests.
//!
//! Each test runs the real router and server on an ephemeral port with a stub
//! status source standing in for the Docker daemon, then probes it over HTTP.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

use swarm_probe::http::{Lifecycle, ProbeServer, ServerError};
use swarm_probe::routes::create_router;
use swarm_probe::state::AppState;
use swarm_probe::{ClusterStatus, LocalNodeState, ProbeError, StatusSource};

/// Returns the same answer on every fetch and counts the fetches.
struct StubSource {
    answer: fn() -> Result<ClusterStatus, ProbeError>,
    fetches: AtomicUsize,
}

impl StubSource {
    fn new(answer: fn() -> Result<ClusterStatus, ProbeError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl StatusSource for StubSource {
    async fn fetch_status(&self) -> Result<ClusterStatus, ProbeError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        (self.answer)()
    }
}

/// Announces that a fetch started, then answers after `delay`.
struct SlowSource {
    started: Arc<Notify>,
    delay: Duration,
}

#[async_trait]
impl StatusSource for SlowSource {
    async fn fetch_status(&self) -> Result<ClusterStatus, ProbeError> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        active()
    }
}

fn status(node_id: &str, cluster_id: &str, state: LocalNodeState) -> ClusterStatus {
    ClusterStatus {
        node_id: node_id.to_string(),
        cluster_id: cluster_id.to_string(),
        local_node_state: state,
    }
}

fn active() -> Result<ClusterStatus, ProbeError> {
    Ok(status("n1", "c1", LocalNodeState::Active))
}

fn inactive() -> Result<ClusterStatus, ProbeError> {
    Ok(status("", "", LocalNodeState::Inactive))
}

fn joining() -> Result<ClusterStatus, ProbeError> {
    Ok(status("n1", "", LocalNodeState::Pending))
}

fn fetch_failed() -> Result<ClusterStatus, ProbeError> {
    Err(ProbeError::StatusFetchFailed(
        "Test - could not get info from docker".to_string(),
    ))
}

fn daemon_down() -> Result<ClusterStatus, ProbeError> {
    Err(ProbeError::DaemonUnavailable("connection refused".to_string()))
}

struct RunningProbe {
    addr: SocketAddr,
    server: ProbeServer,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl RunningProbe {
    fn url(&self) -> String {
        format!("http://{}/ishealthy", self.addr)
    }

    async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.expect("server task panicked")
    }
}

async fn start(source: Arc<dyn StatusSource>, grace: Duration) -> RunningProbe {
    let app = create_router(AppState::new(source, Duration::from_secs(2)));
    let server = ProbeServer::new("127.0.0.1:0".parse().unwrap(), grace);
    let (stop, stopped) = oneshot::channel::<()>();

    let task = tokio::spawn(server.clone().run(app, wait_for(stopped)));
    let addr = server.local_addr().await.expect("probe server did not bind");

    RunningProbe {
        addr,
        server,
        stop: Some(stop),
        task,
    }
}

fn wait_for(rx: oneshot::Receiver<()>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.await;
    }
}

async fn get(url: &str) -> (StatusCode, String) {
    let response = reqwest::get(url).await.expect("probe request failed");
    let status = response.status();
    let body = response.text().await.expect("probe body unreadable");
    (status, body)
}

#[tokio::test]
async fn test_active_member_returns_no_content() {
    let probe = start(StubSource::new(active), Duration::from_secs(5)).await;

    let (status, body) = get(&probe.url()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    probe.stop().await.unwrap();
}

#[tokio::test]
async fn test_inactive_node_returns_not_ready() {
    let probe = start(StubSource::new(inactive), Duration::from_secs(5)).await;

    let (status, body) = get(&probe.url()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Node is not ready");

    probe.stop().await.unwrap();
}

#[tokio::test]
async fn test_joining_node_without_cluster_returns_not_ready() {
    let probe = start(StubSource::new(joining), Duration::from_secs(5)).await;

    let (status, body) = get(&probe.url()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Node is not ready");

    probe.stop().await.unwrap();
}

#[tokio::test]
async fn test_fetch_failure_returns_empty_500() {
    let source = StubSource::new(fetch_failed);
    let probe = start(source.clone(), Duration::from_secs(5)).await;

    let (status, body) = get(&probe.url()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
    // One attempt per request, no retries
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    probe.stop().await.unwrap();
}

#[tokio::test]
async fn test_daemon_unavailable_returns_empty_500_and_keeps_serving() {
    let probe = start(StubSource::new(daemon_down), Duration::from_secs(5)).await;

    for _ in 0..2 {
        let (status, body) = get(&probe.url()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }
    assert_eq!(probe.server.lifecycle(), Lifecycle::Serving);

    probe.stop().await.unwrap();
}

#[tokio::test]
async fn test_repeated_probes_are_identical() {
    let source = StubSource::new(joining);
    let probe = start(source.clone(), Duration::from_secs(5)).await;

    let first = get(&probe.url()).await;
    let second = get(&probe.url()).await;
    assert_eq!(first, second);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

    probe.stop().await.unwrap();
}

#[tokio::test]
async fn test_in_flight_request_completes_during_shutdown() {
    let started = Arc::new(Notify::new());
    let source = Arc::new(SlowSource {
        started: started.clone(),
        delay: Duration::from_millis(300),
    });
    let probe = start(source, Duration::from_secs(5)).await;
    let server = probe.server.clone();
    let mut phases = server.subscribe();

    let url = probe.url();
    let request = tokio::spawn(async move { get(&url).await });

    started.notified().await;
    let addr = probe.addr;
    probe.stop().await.unwrap();

    let (status, body) = request.await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    phases.wait_for(|p| *p == Lifecycle::Stopped).await.unwrap();
    assert!(reqwest::get(format!("http://{addr}/ishealthy")).await.is_err());
}

#[tokio::test]
async fn test_grace_period_bounds_shutdown() {
    let started = Arc::new(Notify::new());
    let source = Arc::new(SlowSource {
        started: started.clone(),
        delay: Duration::from_secs(60),
    });
    let probe = start(source, Duration::from_millis(200)).await;

    let url = probe.url();
    let request = tokio::spawn(async move { reqwest::get(&url).await });

    started.notified().await;
    let server = probe.server.clone();
    tokio::time::timeout(Duration::from_secs(10), probe.stop())
        .await
        .expect("shutdown did not respect the grace period")
        .unwrap();

    assert_eq!(server.lifecycle(), Lifecycle::Stopped);
    request.abort();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let source = StubSource::new(active);
    let probe = start(source.clone(), Duration::from_secs(5)).await;

    let (status, _) = get(&format!("http://{}/health", probe.addr)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

    probe.stop().await.unwrap();
}
