use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub games: usize,
    pub active_game: Option<String>,
}

/// Server status, registered game count, and the running game.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine.read().await;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        games: engine.games().len(),
        active_game: engine.active_id().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "healthy",
            version: "0.1.0",
            games: 2,
            active_game: Some("memoryMatch".to_string()),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"healthy\""));
        assert!(json.contains("\"games\":2"));
        assert!(json.contains("\"activeGame\":\"memoryMatch\""));
    }
}
