use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use arcade_server::config::ServerConfig;
use arcade_server::{build_app, spawn_tick_loop};

pub const INDEX_HTML: &str = "<h1>Arcade Dashboard</h1>";

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "arcade-server-test-{}-{label}-{n}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub stats_dir: PathBuf,
    _shutdown: tokio::task::JoinHandle<()>,
    _ticker: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with an empty stats dir and a one-page web root.
    pub async fn new() -> Self {
        Self::with_stats_dir(scratch_dir("stats")).await
    }

    /// Start a test server reading and writing stats in `stats_dir`.
    pub async fn with_stats_dir(stats_dir: PathBuf) -> Self {
        let web_root = scratch_dir("web");
        std::fs::write(web_root.join("index.html"), INDEX_HTML).unwrap();

        let config = ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            web_root: web_root.to_string_lossy().into_owned(),
            stats_dir: stats_dir.to_string_lossy().into_owned(),
            tick_ms: 10,
            ..ServerConfig::default()
        };
        Self::from_config(config, stats_dir).await
    }

    async fn from_config(config: ServerConfig, stats_dir: PathBuf) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app(config);
        let ticker = spawn_tick_loop(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            stats_dir,
            _shutdown: handle,
            _ticker: ticker,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Contents of the persisted stats file, parsed.
    pub fn stored_stats(&self) -> Option<serde_json::Value> {
        read_stats(&self.stats_dir)
    }
}

pub fn read_stats(dir: &Path) -> Option<serde_json::Value> {
    let text = std::fs::read_to_string(dir.join("gameStats.json")).ok()?;
    serde_json::from_str(&text).ok()
}

/// POST an msgpack body to the active game.
pub async fn send_input(server: &TestServer, body: Vec<u8>) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.url("/api/active/input"))
        .header("content-type", "application/msgpack")
        .body(body)
        .send()
        .await
        .unwrap()
}
