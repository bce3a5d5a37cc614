//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use relief_api::analytics::AnalyticsStore;
use relief_api::config::AppConfig;
use relief_api::directory::Directory;
use relief_api::http::HttpServer;
use relief_api::lifecycle::{Shutdown, ShutdownReason};
use tokio::task::JoinHandle;

/// A server running on a local port for the duration of a test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<AnalyticsStore>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn stop(self) {
        self.shutdown.trigger(ShutdownReason::Requested);
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Start the server with the built-in catalog on `127.0.0.1:<port>`.
pub async fn start_server(port: u16, mut config: AppConfig) -> TestServer {
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config, Directory::builtin(Utc::now())).unwrap();
    let store = server.state().store.clone();
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        addr,
        store,
        client: reqwest::Client::builder().no_proxy().build().unwrap(),
        shutdown,
        handle,
    }
}
