use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default id of the presentation surface games render into.
pub const DEFAULT_MOUNT_POINT: &str = "active-game-area";

/// Opaque identifier of the presentation surface a running game is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MountPoint(pub String);

impl Default for MountPoint {
    fn default() -> Self {
        Self(DEFAULT_MOUNT_POINT.to_string())
    }
}

impl std::fmt::Display for MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Core trait that every arcade game implements.
///
/// The engine owns the running instance, forwards host time and player
/// input to it, and tears it down. The game only handles its own rules and
/// exposes a snapshot for whatever renders it.
pub trait ArcadeGame: Send + Sync {
    /// Static metadata (name, round length) for the running instance.
    fn metadata(&self) -> GameMetadata;

    /// Surface this instance was created for.
    fn mount_point(&self) -> &MountPoint;

    /// Advance the game's clock by `dt`, firing any timers that fall due.
    fn update(&mut self, dt: Duration) -> Vec<GameEvent>;

    /// Apply an encoded, game-specific input (start, reset, click...).
    fn apply_input(&mut self, input: &[u8]) -> Vec<GameEvent>;

    /// Serialize the current session for rendering.
    fn serialize_state(&self) -> Vec<u8>;

    /// Whether a session is in progress.
    fn is_running(&self) -> bool;

    /// Release timers and any other resources. Called once by the engine
    /// before the instance is dropped.
    fn destroy(&mut self) -> Result<(), GameError> {
        Ok(())
    }
}

/// Game metadata for the running instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub round_duration: Duration,
}

/// Events emitted by a game from `update` or `apply_input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreUpdate { score: i64 },
    TimeRemaining { seconds: u32 },
    /// The session ended. `score` is a high-score candidate; `None` when the
    /// game ended without a scored result.
    Finished { score: Option<i64>, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    Teardown(String),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Teardown(m) => write!(f, "teardown failed: {m}"),
        }
    }
}

impl std::error::Error for GameError {}

/// Generates the `serialize_state` and `is_running` methods shared by every
/// game. Requires the implementing struct to have a `state` field that is
/// `Serialize` and has a `running: bool` field.
#[macro_export]
macro_rules! arcade_game_boilerplate {
    () => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).unwrap_or_default()
        }

        fn is_running(&self) -> bool {
            self.state.running
        }
    };
}

/// Decode a game-specific input, logging and returning `None` on garbage.
pub fn decode_input<T: serde::de::DeserializeOwned>(game: &str, input: &[u8]) -> Option<T> {
    match rmp_serde::from_slice(input) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(game, error = %e, "Ignoring undecodable input");
            None
        },
    }
}
