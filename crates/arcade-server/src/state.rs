use std::sync::Arc;
use tokio::sync::RwLock;

use arcade_core::engine::ArcadeEngine;

use crate::config::ServerConfig;

pub type SharedEngine = Arc<RwLock<ArcadeEngine>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: ArcadeEngine, config: ServerConfig) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            config: Arc::new(config),
        }
    }
}
