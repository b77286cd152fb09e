//! Test server management

use msgq::{config::QueueConfig, create_router};
use msgq_queue::{MemoryStore, QueueState};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::STARTUP_TIMEOUT_SECS;

/// A running msgq server bound to a random local port
pub struct TestServer {
    port: u16,
    base_url: String,
    store: Arc<MemoryStore>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server backed by a fresh in-memory store
    pub async fn start() -> Result<Self, TestError> {
        Self::start_with(MemoryStore::new()).await
    }

    /// Start a server backed by `store`
    pub async fn start_with(store: MemoryStore) -> Result<Self, TestError> {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| TestError::StartFailed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| TestError::StartFailed(e.to_string()))?
            .port();

        let store = Arc::new(store);
        let app = create_router(
            Arc::new(QueueState::new(store.clone())),
            &QueueConfig::default(),
        );
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        info!(port = port, "Starting msgq test server");
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                warn!(error = %e, "msgq test server exited with an error");
            }
        });

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{port}"),
            store,
            shutdown: Some(shutdown_tx),
            task,
        };
        server.wait_ready().await?;
        Ok(server)
    }

    async fn wait_ready(&self) -> Result<(), TestError> {
        let health = format!("{}/health", self.base_url);
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_secs(STARTUP_TIMEOUT_SECS) {
            if let Ok(response) = reqwest::get(&health).await {
                if response.status().is_success() {
                    info!(port = self.port, "msgq ready");
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Err(TestError::StartupTimeout)
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The store behind the server
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Get a client for the server
    pub fn client(&self) -> crate::MsgQClient {
        crate::MsgQClient::new(self.base_url.clone())
    }

    /// Stop the server and wait for in-flight requests to finish
    pub async fn stop(mut self) {
        info!("Stopping msgq test server");
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
        info!("msgq test server stopped");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Errors that can occur with the test server
#[derive(Debug, Error)]
pub enum TestError {
    #[error("Failed to start server: {0}")]
    StartFailed(String),
    #[error("Server startup timed out")]
    StartupTimeout,
}
