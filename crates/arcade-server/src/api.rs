use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use arcade_core::engine::EngineError;
use arcade_core::game_registry::GameSummary;
use arcade_core::game_trait::GameEvent;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
    pub status: &'static str,
}

/// GET /api/hello
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from Arcade!",
        status: "success",
    })
}

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<GameSummary>,
}

/// GET /api/games — every registered game, in registration order.
pub async fn list_games(State(state): State<AppState>) -> Json<GamesResponse> {
    let engine = state.engine.read().await;
    Json(GamesResponse {
        games: engine.summaries(),
    })
}

/// GET /api/games/{id}
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    let engine = state.engine.read().await;
    engine
        .game(&id)
        .map(|g| Json(g.summary()))
        .ok_or_else(|| EngineError::NotFound(id).into())
}

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
    pub score: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub updated: bool,
    pub high_score: u64,
}

/// POST /api/games/{id}/scores — offer a high-score candidate.
pub async fn post_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ScoreBody>, JsonRejection>,
) -> Result<Json<ScoreResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut engine = state.engine.write().await;
    if engine.game(&id).is_none() {
        return Err(EngineError::NotFound(id).into());
    }
    let updated = engine.report_score(&id, body.score);
    let high_score = engine.game(&id).map_or(0, |g| g.high_score());
    Ok(Json(ScoreResponse {
        updated,
        high_score,
    }))
}

/// POST /api/games/{id}/launch — replace the active game.
pub async fn launch_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    let mut engine = state.engine.write().await;
    engine.launch(&id)?;
    let summary = engine
        .game(&id)
        .map(|g| g.summary())
        .ok_or(EngineError::NotFound(id))?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveResponse {
    pub game_id: Option<String>,
    pub name: Option<String>,
    pub round_seconds: Option<u64>,
    pub mount_point: Option<String>,
}

/// GET /api/active — the running game as its instance describes itself.
pub async fn active_game(State(state): State<AppState>) -> Json<ActiveResponse> {
    let engine = state.engine.read().await;
    let (metadata, mount) = engine.active_metadata().unzip();
    Json(ActiveResponse {
        game_id: engine.active_id().map(str::to_string),
        name: metadata.as_ref().map(|m| m.name.clone()),
        round_seconds: metadata.as_ref().map(|m| m.round_duration.as_secs()),
        mount_point: mount.map(|m| m.0),
    })
}

/// GET /api/active/state — msgpack snapshot of the running game.
pub async fn active_state(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let engine = state.engine.read().await;
    let snapshot = engine.active_state().ok_or(EngineError::NoActiveGame)?;
    Ok(([(header::CONTENT_TYPE, "application/msgpack")], snapshot))
}

#[derive(Debug, Serialize)]
pub struct InputResponse {
    pub events: Vec<GameEvent>,
}

/// POST /api/active/input — forward a msgpack-encoded input.
pub async fn active_input(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InputResponse>, AppError> {
    let mut engine = state.engine.write().await;
    let events = engine.apply_input(&body)?;
    Ok(Json(InputResponse { events }))
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub ended: bool,
}

/// DELETE /api/active
pub async fn end_active(State(state): State<AppState>) -> Json<EndResponse> {
    let mut engine = state.engine.write().await;
    Json(EndResponse {
        ended: engine.end_active(),
    })
}
