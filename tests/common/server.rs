//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases, document
//! directory and stub external feed.

use super::constants::*;
use axum::{routing::get, Router};
use signage_index_server::compiler::{
    CompilerDefaults, DocumentAssembler, HttpExternalSource, IndexCompiler, ItemCompiler,
    StoredContentSource, DEFAULT_MAX_DEPTH,
};
use signage_index_server::delivery::{IndexFileStore, IndexPublisher};
use signage_index_server::player_store::{PlayerLookup, PlayerStore, SqlitePlayerStore};
use signage_index_server::playlist_store::{PlaylistStore, SqlitePlaylistStore};
use signage_index_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated stores and document directory
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// URL of the stub external feed
    pub feed_url: String,

    /// Playlist store for seeding content directly
    pub playlists: Arc<dyn PlaylistStore>,

    /// Player store for assigning playlists and pending tasks
    pub players: Arc<dyn PlayerStore>,

    /// Path of the playlist database, for raw SQL fixtures
    pub playlist_db_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    _feed_shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

async fn serve_until(
    listener: TcpListener,
    app: Router,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        })
        .await
        .expect("Server failed");
}

async fn bind_random_port() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();
    (listener, format!("http://127.0.0.1:{}", port))
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Creates temporary playlist and player databases
    /// 2. Starts a stub external feed on its own random port
    /// 3. Binds the index server to a random port (127.0.0.1:0)
    /// 4. Spawns both in background tasks
    /// 5. Waits for the index server to be ready
    ///
    /// # Panics
    ///
    /// Panics if any store cannot be opened, a port cannot be bound or the
    /// server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let playlist_db_path = temp_dir.path().join("playlists.db");

        let playlists: Arc<dyn PlaylistStore> = Arc::new(
            SqlitePlaylistStore::new(&playlist_db_path).expect("Failed to open playlist store"),
        );
        let players: Arc<dyn PlayerStore> = Arc::new(
            SqlitePlayerStore::new(temp_dir.path().join("players.db"))
                .expect("Failed to open player store"),
        );

        // Stub external feed
        let (feed_listener, feed_base_url) = bind_random_port().await;
        let (feed_shutdown_tx, feed_shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let feed_app = Router::new().route(FEED_PATH, get(|| async { FEED_BODY }));
        tokio::spawn(serve_until(feed_listener, feed_app, feed_shutdown_rx));

        let (listener, base_url) = bind_random_port().await;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let compiler = IndexCompiler::new(
            Arc::new(StoredContentSource::new(
                playlists.clone(),
                ItemCompiler::new(CompilerDefaults::default()),
            )),
            Arc::new(HttpExternalSource::new(2, 0).expect("Failed to build feed client")),
            DocumentAssembler::new(&base_url, 900),
            DEFAULT_MAX_DEPTH,
        );
        let publisher = IndexPublisher::new(
            PlayerLookup::new(players.clone()),
            compiler,
            IndexFileStore::new(temp_dir.path().join("documents"))
                .expect("Failed to create document store"),
        );

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port: 0,
            metrics_port: 0,
        };
        let app = make_app(config, publisher);
        tokio::spawn(serve_until(listener, app, shutdown_rx));

        let server = Self {
            base_url,
            feed_url: format!("{}{}", feed_base_url, FEED_PATH),
            playlists,
            players,
            playlist_db_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
            _feed_shutdown_tx: Some(feed_shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(tx) = self._feed_shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
