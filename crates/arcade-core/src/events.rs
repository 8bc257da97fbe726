use std::panic::AssertUnwindSafe;

use serde::{Deserialize, Serialize};

use crate::game_registry::GameSummary;

/// Event names the engine publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    GameRegistered,
    GameLaunched,
    GameEnded,
    HighScoreUpdated,
    ScoreReported,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        Self::GameRegistered,
        Self::GameLaunched,
        Self::GameEnded,
        Self::HighScoreUpdated,
        Self::ScoreReported,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameRegistered => "gameRegistered",
            Self::GameLaunched => "gameLaunched",
            Self::GameEnded => "gameEnded",
            Self::HighScoreUpdated => "highScoreUpdated",
            Self::ScoreReported => "scoreReported",
        }
    }
}

/// An engine event with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum EngineEvent {
    GameRegistered(GameSummary),
    GameLaunched(GameSummary),
    GameEnded(GameSummary),
    #[serde(rename_all = "camelCase")]
    HighScoreUpdated {
        game_id: String,
        score: u64,
    },
    /// A finished round's score offered as a high-score candidate, whether
    /// or not it won.
    #[serde(rename_all = "camelCase")]
    ScoreReported {
        game_id: String,
        score: i64,
    },
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::GameRegistered(_) => EventKind::GameRegistered,
            Self::GameLaunched(_) => EventKind::GameLaunched,
            Self::GameEnded(_) => EventKind::GameEnded,
            Self::HighScoreUpdated { .. } => EventKind::HighScoreUpdated,
            Self::ScoreReported { .. } => EventKind::ScoreReported,
        }
    }
}

/// Failure reported by a subscriber. Logged by the bus; never stops delivery
/// to the remaining subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError(pub String);

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HandlerError {}

/// Token returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&EngineEvent) -> Result<(), HandlerError> + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

/// Synchronous publish/subscribe keyed by [`EventKind`].
///
/// Handlers run in registration order. The same closure subscribed twice
/// runs twice. Nothing is retained: a late subscriber never sees past events.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&EngineEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver `event` to every handler registered for its kind. A handler
    /// that returns an error or panics is logged and skipped over.
    /// Returns how many handlers failed.
    pub fn publish(&mut self, event: &EngineEvent) -> usize {
        let kind = event.kind();
        let mut failures = 0;
        for sub in self.subscriptions.iter_mut().filter(|s| s.kind == kind) {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| (sub.handler)(event)));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => HandlerError(panic_message(payload.as_ref())),
            };
            failures += 1;
            tracing::warn!(event = kind.as_str(), error = %error, "Event handler failed");
        }
        failures
    }

    /// Number of handlers registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("handler panicked: {msg}")
    } else {
        "handler panicked".to_string()
    }
}
