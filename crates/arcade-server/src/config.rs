use std::time::Duration;

use serde::Deserialize;

use arcade_core::game_trait::DEFAULT_MOUNT_POINT;

/// File read by [`ServerConfig::load`] from the working directory.
pub const CONFIG_FILE: &str = "arcade.toml";

/// Top-level server configuration, loaded from `arcade.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Directory served under `/arcade/`.
    pub web_root: String,
    /// Directory holding persisted stats (`gameStats.json`).
    pub stats_dir: String,
    pub mount_point: String,
    /// Period of the background tick that drives the active game.
    pub tick_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            web_root: "arcade_collection".to_string(),
            stats_dir: "data".to_string(),
            mount_point: DEFAULT_MOUNT_POINT.to_string(),
            tick_ms: 100,
        }
    }
}

impl ServerConfig {
    /// Reject values the server cannot run with.
    pub fn check(&self) -> Result<(), String> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "listen_addr is not a valid socket address: {}",
                self.listen_addr
            ));
        }
        if self.tick_ms == 0 {
            return Err("tick_ms must be > 0".to_string());
        }
        Ok(())
    }

    /// Validate configuration, exiting on values the server cannot run with.
    pub fn validate(&self) {
        if let Err(e) = self.check() {
            tracing::error!("{e}");
            std::process::exit(1);
        }
        if self.mount_point.trim().is_empty() {
            tracing::warn!(
                default = DEFAULT_MOUNT_POINT,
                "mount_point is blank, games will mount into an unnamed area"
            );
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Load config from `arcade.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file(CONFIG_FILE);
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn load_file(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from {path}");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No {path} found, using defaults");
                ServerConfig::default()
            },
        }
    }

    /// Apply `ARCADE_*` overrides. Empty or unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = var("ARCADE_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = var("ARCADE_WEB_ROOT") {
            self.web_root = root;
        }
        if let Some(dir) = var("ARCADE_STATS_DIR") {
            self.stats_dir = dir;
        }
        if let Some(mount) = var("ARCADE_MOUNT_POINT") {
            self.mount_point = mount;
        }
        if let Some(val) = var("ARCADE_TICK_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            self.tick_ms = ms;
        }
    }
}
