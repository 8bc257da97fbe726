use std::time::Duration;

use crate::events::{EngineEvent, EventBus, EventKind, HandlerError, SubscriptionId};
use crate::game_registry::{
    GameDescriptor, GameRegistration, GameRegistry, GameSummary, ValidationError,
};
use crate::game_trait::{ArcadeGame, GameEvent, GameMetadata, MountPoint};
use crate::stats::{STATS_KEY, StatsSnapshot, StatsStore, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotFound(String),
    NoActiveGame,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "game not found with id: {id}"),
            Self::NoActiveGame => write!(f, "no game is active"),
        }
    }
}

impl std::error::Error for EngineError {}

/// The running game: a back-reference to its descriptor plus the instance.
struct ActiveGame {
    game_id: String,
    instance: Box<dyn ArcadeGame>,
}

/// Registry, lifecycle coordinator, and event bus in one context object.
///
/// At most one game runs at a time. Launching tears down the previous game
/// first; a failing teardown is logged and never blocks the launch. Stats
/// are written to the [`StatsStore`] whenever a play count or high score
/// changes.
pub struct ArcadeEngine {
    registry: GameRegistry,
    bus: EventBus,
    active: Option<ActiveGame>,
    store: Box<dyn StatsStore>,
    mount_point: MountPoint,
}

impl std::fmt::Debug for ArcadeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcadeEngine")
            .field("games", &self.registry.len())
            .field("active", &self.active_id())
            .field("mount_point", &self.mount_point)
            .finish_non_exhaustive()
    }
}

impl ArcadeEngine {
    pub fn new(store: Box<dyn StatsStore>) -> Self {
        Self::with_mount_point(store, MountPoint::default())
    }

    pub fn with_mount_point(store: Box<dyn StatsStore>, mount_point: MountPoint) -> Self {
        Self {
            registry: GameRegistry::new(),
            bus: EventBus::new(),
            active: None,
            store,
            mount_point,
        }
    }

    pub fn mount_point(&self) -> &MountPoint {
        &self.mount_point
    }

    // ---- Event bus ----

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ---- Registry ----

    /// Register a game and announce it with `gameRegistered`.
    pub fn register(
        &mut self,
        registration: GameRegistration,
    ) -> Result<GameSummary, ValidationError> {
        let summary = match self.registry.register(registration) {
            Ok(stored) => stored.summary(),
            Err(e) => {
                tracing::error!(error = %e, "Error registering game");
                return Err(e);
            },
        };
        self.bus.publish(&EngineEvent::GameRegistered(summary.clone()));
        Ok(summary)
    }

    pub fn games(&self) -> &[GameDescriptor] {
        self.registry.list()
    }

    pub fn summaries(&self) -> Vec<GameSummary> {
        self.registry.summaries()
    }

    pub fn game(&self, id: &str) -> Option<&GameDescriptor> {
        self.registry.get(id)
    }

    // ---- Lifecycle ----

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.game_id.as_str())
    }

    /// Metadata and mount point reported by the running instance.
    pub fn active_metadata(&self) -> Option<(GameMetadata, MountPoint)> {
        self.active
            .as_ref()
            .map(|a| (a.instance.metadata(), a.instance.mount_point().clone()))
    }

    /// Render snapshot of the active game.
    pub fn active_state(&self) -> Option<Vec<u8>> {
        self.active.as_ref().map(|a| a.instance.serialize_state())
    }

    /// Launch the game registered under `id`, replacing any active game.
    pub fn launch(&mut self, id: &str) -> Result<(), EngineError> {
        if self.registry.get(id).is_none() {
            tracing::error!(game = %id, "Game not found");
            return Err(EngineError::NotFound(id.to_string()));
        }

        self.teardown_active();

        let Some(descriptor) = self.registry.get_mut(id) else {
            return Err(EngineError::NotFound(id.to_string()));
        };
        descriptor.record_play();
        let summary = descriptor.summary();
        self.bus.publish(&EngineEvent::GameLaunched(summary));

        let Some(descriptor) = self.registry.get(id) else {
            return Err(EngineError::NotFound(id.to_string()));
        };
        let instance = descriptor.instantiate(&self.mount_point);
        tracing::info!(game = %id, mount = %self.mount_point, "Game launched");
        self.active = Some(ActiveGame {
            game_id: id.to_string(),
            instance,
        });

        self.persist_logged();
        Ok(())
    }

    /// End the active game. Returns false when nothing was running.
    pub fn end_active(&mut self) -> bool {
        self.teardown_active()
    }

    fn teardown_active(&mut self) -> bool {
        let Some(mut previous) = self.active.take() else {
            return false;
        };

        if let Err(e) = previous.instance.destroy() {
            tracing::warn!(game = %previous.game_id, error = %e, "Game teardown failed");
        }
        drop(previous.instance);

        match self.registry.get(&previous.game_id) {
            Some(descriptor) => {
                let summary = descriptor.summary();
                self.bus.publish(&EngineEvent::GameEnded(summary));
            },
            None => {
                tracing::warn!(game = %previous.game_id, "Ended game is no longer registered");
            },
        }
        tracing::info!(game = %previous.game_id, "Game ended");
        true
    }

    /// Offer `score` as a new high score for `id`. Every report for a known
    /// game is announced with `scoreReported`; the high score updates only
    /// when strictly greater than the current one.
    pub fn report_score(&mut self, id: &str, score: i64) -> bool {
        if self.registry.get(id).is_none() {
            tracing::warn!(game = %id, score, "Score reported for unknown game");
            return false;
        }
        self.bus.publish(&EngineEvent::ScoreReported {
            game_id: id.to_string(),
            score,
        });

        let Some(descriptor) = self.registry.get_mut(id) else {
            return false;
        };
        let Ok(score) = u64::try_from(score) else {
            return false;
        };
        if score <= descriptor.high_score() {
            return false;
        }

        descriptor.set_high_score(score);
        tracing::info!(game = %id, score, "New high score");
        self.bus.publish(&EngineEvent::HighScoreUpdated {
            game_id: id.to_string(),
            score,
        });
        self.persist_logged();
        true
    }

    /// Advance the active game's clock. Finished sessions with a score are
    /// reported as high-score candidates.
    pub fn update(&mut self, dt: Duration) -> Vec<GameEvent> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        let events = active.instance.update(dt);
        self.handle_game_events(&events);
        events
    }

    /// Forward an encoded input to the active game.
    pub fn apply_input(&mut self, input: &[u8]) -> Result<Vec<GameEvent>, EngineError> {
        let active = self.active.as_mut().ok_or(EngineError::NoActiveGame)?;
        let events = active.instance.apply_input(input);
        self.handle_game_events(&events);
        Ok(events)
    }

    fn handle_game_events(&mut self, events: &[GameEvent]) {
        let Some(game_id) = self.active_id().map(str::to_string) else {
            return;
        };
        for event in events {
            if let GameEvent::Finished {
                score: Some(score), ..
            } = event
            {
                self.report_score(&game_id, *score);
            }
        }
    }

    // ---- Persistence ----

    /// Write the current stats snapshot to the store.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        let json = StatsSnapshot::from_descriptors(self.registry.list()).to_json()?;
        self.store.save(STATS_KEY, &json)
    }

    fn persist_logged(&mut self) {
        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "Failed to save game stats");
        }
    }

    /// Merge stored stats into registered games. Unknown ids are ignored;
    /// unreadable or malformed data counts as no stored stats. Returns how
    /// many registered games were updated.
    pub fn restore(&mut self) -> usize {
        let text = match self.store.load(STATS_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return 0,
            Err(e) => {
                tracing::warn!(error = %e, "Error loading game stats");
                return 0;
            },
        };
        let snapshot = match StatsSnapshot::parse(&text) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Error loading game stats");
                return 0;
            },
        };

        let mut merged = 0;
        for (id, stats) in snapshot.games {
            if let Some(descriptor) = self.registry.get_mut(&id) {
                descriptor.set_play_count(stats.play_count);
                descriptor.set_high_score(stats.high_score);
                merged += 1;
            }
        }
        tracing::info!(merged, "Loaded game stats");
        merged
    }
}
