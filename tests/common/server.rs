//! Test server lifecycle management

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;

use tutor_server::progress::SqliteTrainingStore;
use tutor_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use tutor_server::user::SqliteUserStore;

use super::SERVER_READY_TIMEOUT_MS;

/// Test server instance with isolated databases.
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Training store for direct database access in tests
    pub training_store: Arc<SqliteTrainingStore>,

    /// User store for direct database access in tests
    pub user_store: Arc<SqliteUserStore>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port and waits until it answers.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");

        let user_store = Arc::new(
            SqliteUserStore::new(temp_db_dir.path().join("users.db"))
                .expect("Failed to open user store"),
        );
        let training_store = Arc::new(
            SqliteTrainingStore::new(temp_db_dir.path().join("training.db"))
                .expect("Failed to open training store"),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };
        let app = make_app(config, user_store.clone(), training_store.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            training_store,
            user_store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        while start.elapsed() < timeout {
            if let Ok(response) = client.get(&self.base_url).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Server at {} did not become ready", self.base_url);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            tx.send(()).ok();
        }
    }
}
