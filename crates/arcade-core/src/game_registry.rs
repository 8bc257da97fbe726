use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game_trait::{ArcadeGame, MountPoint};

/// Creation capability: builds a running game bound to a mount point.
pub type GameFactory = Arc<dyn Fn(&MountPoint) -> Box<dyn ArcadeGame> + Send + Sync>;

/// Typed input to [`GameRegistry::register`]. Required fields are
/// constructor arguments; stats default to zero.
#[derive(Clone)]
pub struct GameRegistration {
    pub id: String,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub play_count: u32,
    pub high_score: u64,
    pub create: GameFactory,
}

impl GameRegistration {
    pub fn new<F>(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        thumbnail: impl Into<String>,
        create: F,
    ) -> Self
    where
        F: Fn(&MountPoint) -> Box<dyn ArcadeGame> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            thumbnail: thumbnail.into(),
            play_count: 0,
            high_score: 0,
            create: Arc::new(create),
        }
    }

    pub fn with_stats(mut self, play_count: u32, high_score: u64) -> Self {
        self.play_count = play_count;
        self.high_score = high_score;
        self
    }

    /// Reject blank required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("id", &self.id),
            ("name", &self.name),
            ("description", &self.description),
            ("thumbnail", &self.thumbnail),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GameRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRegistration")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => {
                write!(f, "game configuration missing required property: {field}")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// A registered game. Stats are mutated only by the engine.
#[derive(Clone)]
pub struct GameDescriptor {
    id: String,
    name: String,
    description: String,
    thumbnail: String,
    play_count: u32,
    high_score: u64,
    create: GameFactory,
}

impl GameDescriptor {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            thumbnail: self.thumbnail.clone(),
            play_count: self.play_count,
            high_score: self.high_score,
        }
    }

    pub(crate) fn instantiate(&self, mount: &MountPoint) -> Box<dyn ArcadeGame> {
        (self.create)(mount)
    }

    pub(crate) fn record_play(&mut self) {
        self.play_count = self.play_count.saturating_add(1);
    }

    pub(crate) fn set_high_score(&mut self, score: u64) {
        self.high_score = score;
    }

    pub(crate) fn set_play_count(&mut self, play_count: u32) {
        self.play_count = play_count;
    }
}

impl std::fmt::Debug for GameDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("play_count", &self.play_count)
            .field("high_score", &self.high_score)
            .finish_non_exhaustive()
    }
}

/// Read-only projection of a descriptor, as consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub play_count: u32,
    pub high_score: u64,
}

/// Game catalog keyed by id, listed in insertion order.
#[derive(Default)]
pub struct GameRegistry {
    games: Vec<GameDescriptor>,
    index: HashMap<String, usize>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a game. Registering an existing id replaces that
    /// entry in place.
    pub fn register(
        &mut self,
        registration: GameRegistration,
    ) -> Result<&GameDescriptor, ValidationError> {
        registration.validate()?;

        let descriptor = GameDescriptor {
            id: registration.id,
            name: registration.name,
            description: registration.description,
            thumbnail: registration.thumbnail,
            play_count: registration.play_count,
            high_score: registration.high_score,
            create: registration.create,
        };

        let slot = match self.index.get(&descriptor.id) {
            Some(&slot) => {
                tracing::warn!(game = %descriptor.id, "Replacing already registered game");
                self.games[slot] = descriptor;
                slot
            },
            None => {
                let slot = self.games.len();
                self.index.insert(descriptor.id.clone(), slot);
                self.games.push(descriptor);
                slot
            },
        };

        let stored = &self.games[slot];
        tracing::info!(game = %stored.id, name = %stored.name, "Game registered");
        Ok(stored)
    }

    pub fn list(&self) -> &[GameDescriptor] {
        &self.games
    }

    pub fn summaries(&self) -> Vec<GameSummary> {
        self.games.iter().map(GameDescriptor::summary).collect()
    }

    pub fn get(&self, id: &str) -> Option<&GameDescriptor> {
        self.index.get(id).map(|&slot| &self.games[slot])
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut GameDescriptor> {
        self.index.get(id).map(|&slot| &mut self.games[slot])
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
