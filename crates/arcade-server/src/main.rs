use tracing_subscriber::EnvFilter;

use arcade_server::config::ServerConfig;
use arcade_server::{build_app, spawn_tick_loop};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load();
    config.validate();
    let listen_addr = config.listen_addr.clone();

    tracing::info!(web_root = %config.web_root, stats_dir = %config.stats_dir, "Arcade server starting");

    let (app, state) = build_app(config);
    spawn_tick_loop(state);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %listen_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        },
    };
    tracing::info!(addr = %listen_addr, "Listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
    }
}
