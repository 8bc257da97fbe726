pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod state;

use axum::Router;
use axum::response::Redirect;
use axum::routing::{get, post};
use tokio::time::{Instant, MissedTickBehavior};
use tower_http::services::ServeDir;

use arcade_core::engine::ArcadeEngine;
use arcade_core::events::EventKind;
use arcade_core::game_trait::{GameEvent, MountPoint};
use arcade_core::stats::FileStore;

use config::ServerConfig;
use state::AppState;

/// Build the engine with every bundled game registered and stored stats
/// merged in.
pub fn build_engine(config: &ServerConfig) -> ArcadeEngine {
    let store = FileStore::new(&config.stats_dir);
    let mut engine =
        ArcadeEngine::with_mount_point(Box::new(store), MountPoint(config.mount_point.clone()));

    for kind in EventKind::ALL {
        engine.subscribe(kind, |event| {
            tracing::debug!(kind = event.kind().as_str(), ?event, "Engine event");
            Ok(())
        });
    }

    for registration in [
        arcade_balloon_pop::registration(),
        arcade_memory_match::registration(),
    ] {
        // Rejections are already logged by the engine.
        let _ = engine.register(registration);
    }
    engine.restore();
    engine
}

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let engine = build_engine(&config);
    let state = AppState::new(engine, config);

    let api_routes = Router::new()
        .route("/hello", get(api::hello))
        .route("/games", get(api::list_games))
        .route("/games/{id}", get(api::get_game))
        .route("/games/{id}/scores", post(api::post_score))
        .route("/games/{id}/launch", post(api::launch_game))
        .route("/active", get(api::active_game).delete(api::end_active))
        .route("/active/state", get(api::active_state))
        .route("/active/input", post(api::active_input));

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/arcade/") }))
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .nest_service("/arcade", ServeDir::new(&web_root))
        .with_state(state.clone());

    (app, state)
}

/// Background task that advances the active game by wall-clock time.
pub fn spawn_tick_loop(state: AppState) -> tokio::task::JoinHandle<()> {
    let period = state.config.tick_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        loop {
            interval.tick().await;
            let now = Instant::now();
            let dt = now - last;
            last = now;

            let mut engine = state.engine.write().await;
            for event in engine.update(dt) {
                if let GameEvent::Finished { score, message } = event {
                    tracing::info!(game = ?engine.active_id(), ?score, "{message}");
                }
            }
        }
    })
}
