pub mod targets;

use std::collections::HashMap;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use arcade_core::game_registry::GameRegistration;
use arcade_core::game_trait::{ArcadeGame, GameEvent, GameMetadata, MountPoint, decode_input};
use arcade_core::scheduler::{Fired, Scheduler, TimerId};

use targets::{PlayArea, Target, random_target};

pub const GAME_ID: &str = "balloon-pop";
pub const GAME_NAME: &str = "Balloon Pop";
pub const GAME_DESCRIPTION: &str =
    "Click on balloons before they disappear! Test your reflexes in this fast-paced game.";
pub const GAME_THUMBNAIL: &str = "/games/balloonPop/thumbnail.jpg";

/// Length of a round in seconds.
pub const ROUND_SECONDS: u32 = 30;
/// One balloon appears per spawn tick.
pub const SPAWN_PERIOD: Duration = Duration::from_secs(1);
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
/// How long an unpopped balloon stays up.
pub const TARGET_LIFETIME: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BalloonTimer {
    Spawn,
    Countdown,
    Expire(u64),
}

/// Serializable session state handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalloonState {
    pub score: u32,
    pub remaining_secs: u32,
    pub targets: Vec<Target>,
    pub running: bool,
    /// Status line shown under the play area; empty while playing.
    pub message: String,
}

impl Default for BalloonState {
    fn default() -> Self {
        Self {
            score: 0,
            remaining_secs: ROUND_SECONDS,
            targets: Vec::new(),
            running: false,
            message: String::new(),
        }
    }
}

/// Player input, encoded with `rmp-serde`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalloonInput {
    Start,
    Reset,
    Pop { target_id: u64 },
}

/// The Balloon Pop reflex game, implementing `ArcadeGame`.
pub struct BalloonPop {
    state: BalloonState,
    area: PlayArea,
    mount: MountPoint,
    timers: Scheduler<BalloonTimer>,
    expiries: HashMap<u64, TimerId>,
    next_target_id: u64,
    rng: StdRng,
}

impl BalloonPop {
    pub fn new(mount: MountPoint) -> Self {
        Self::with_rng(mount, PlayArea::default(), StdRng::from_os_rng())
    }

    /// Deterministic instance for tests and replays.
    pub fn with_seed(mount: MountPoint, area: PlayArea, seed: u64) -> Self {
        Self::with_rng(mount, area, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mount: MountPoint, area: PlayArea, rng: StdRng) -> Self {
        Self {
            state: BalloonState::default(),
            area,
            mount,
            timers: Scheduler::new(),
            expiries: HashMap::new(),
            next_target_id: 0,
            rng,
        }
    }

    pub fn state(&self) -> &BalloonState {
        &self.state
    }

    pub fn area(&self) -> PlayArea {
        self.area
    }

    /// Begin a round. Returns false if one is already running.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            return false;
        }
        self.state.running = true;
        self.state.score = 0;
        self.state.remaining_secs = ROUND_SECONDS;
        self.state.message.clear();

        self.timers.every(SPAWN_PERIOD, BalloonTimer::Spawn);
        self.timers.every(COUNTDOWN_PERIOD, BalloonTimer::Countdown);
        tracing::debug!(game = GAME_ID, "Round started");
        true
    }

    /// Pop a live target. Scores exactly one point; false if the round is
    /// over or the target already expired or was popped.
    pub fn pop(&mut self, target_id: u64) -> bool {
        if !self.state.running {
            return false;
        }
        let Some(pos) = self.state.targets.iter().position(|t| t.id == target_id) else {
            return false;
        };
        self.state.targets.remove(pos);
        if let Some(timer) = self.expiries.remove(&target_id) {
            self.timers.cancel(timer);
        }
        self.state.score += 1;
        true
    }

    /// Stop the round: cancel all timers and discard live targets unscored.
    /// Returns the `Finished` event when a round was running.
    pub fn end(&mut self) -> Option<GameEvent> {
        if !self.state.running {
            return None;
        }
        self.clear_session();
        self.state.message = format!("Game Over! Final Score: {}", self.state.score);
        tracing::info!(game = GAME_ID, score = self.state.score, "Round over");
        Some(GameEvent::Finished {
            score: Some(i64::from(self.state.score)),
            message: self.state.message.clone(),
        })
    }

    /// End any running round, then restore the idle display.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        let ended = self.end();
        self.state.score = 0;
        self.state.remaining_secs = ROUND_SECONDS;
        self.state.message.clear();
        ended.into_iter().collect()
    }

    fn clear_session(&mut self) {
        self.timers.cancel_all();
        self.expiries.clear();
        self.state.targets.clear();
        self.state.running = false;
    }

    fn spawn(&mut self) {
        let id = self.next_target_id;
        self.next_target_id += 1;
        let target = random_target(&mut self.rng, self.area, id, self.timers.now());
        let timer = self.timers.after(TARGET_LIFETIME, BalloonTimer::Expire(id));
        self.expiries.insert(id, timer);
        self.state.targets.push(target);
    }

    fn on_timer(&mut self, fired: Fired<BalloonTimer>) -> Vec<GameEvent> {
        match fired.kind {
            BalloonTimer::Spawn => {
                self.spawn();
                Vec::new()
            },
            BalloonTimer::Countdown => {
                self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
                let mut events = vec![GameEvent::TimeRemaining {
                    seconds: self.state.remaining_secs,
                }];
                if self.state.remaining_secs == 0 {
                    events.extend(self.end());
                }
                events
            },
            BalloonTimer::Expire(id) => {
                self.expiries.remove(&id);
                self.state.targets.retain(|t| t.id != id);
                Vec::new()
            },
        }
    }
}

impl ArcadeGame for BalloonPop {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: GAME_NAME.to_string(),
            description: GAME_DESCRIPTION.to_string(),
            round_duration: Duration::from_secs(u64::from(ROUND_SECONDS)),
        }
    }

    fn mount_point(&self) -> &MountPoint {
        &self.mount
    }

    fn update(&mut self, dt: Duration) -> Vec<GameEvent> {
        let deadline = self.timers.deadline(dt);
        let mut events = Vec::new();
        while let Some(fired) = self.timers.pop_due(deadline) {
            events.extend(self.on_timer(fired));
        }
        self.timers.advance_to(deadline);
        events
    }

    fn apply_input(&mut self, input: &[u8]) -> Vec<GameEvent> {
        let Some(input) = decode_input::<BalloonInput>(GAME_ID, input) else {
            return Vec::new();
        };
        match input {
            BalloonInput::Start => {
                if self.start() {
                    vec![GameEvent::TimeRemaining {
                        seconds: self.state.remaining_secs,
                    }]
                } else {
                    Vec::new()
                }
            },
            BalloonInput::Reset => self.reset(),
            BalloonInput::Pop { target_id } => {
                if self.pop(target_id) {
                    vec![GameEvent::ScoreUpdate {
                        score: i64::from(self.state.score),
                    }]
                } else {
                    Vec::new()
                }
            },
        }
    }

    fn destroy(&mut self) -> Result<(), arcade_core::game_trait::GameError> {
        self.clear_session();
        Ok(())
    }

    arcade_core::arcade_game_boilerplate!();
}

/// Registration handed to the engine at startup.
pub fn registration() -> GameRegistration {
    GameRegistration::new(
        GAME_ID,
        GAME_NAME,
        GAME_DESCRIPTION,
        GAME_THUMBNAIL,
        |mount: &MountPoint| -> Box<dyn ArcadeGame> {
            Box::new(BalloonPop::new(mount.clone()))
        },
    )
}
