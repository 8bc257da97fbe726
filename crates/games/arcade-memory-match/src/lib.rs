pub mod deck;
pub mod scoring;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use arcade_core::game_registry::GameRegistration;
use arcade_core::game_trait::{
    ArcadeGame, GameError, GameEvent, GameMetadata, MountPoint, decode_input,
};
use arcade_core::scheduler::{Fired, Scheduler};

use deck::{Card, CardState, deal};
use scoring::calculate_score;

pub const GAME_ID: &str = "memoryMatch";
pub const GAME_NAME: &str = "Memory Match";
pub const GAME_DESCRIPTION: &str =
    "Test your memory by matching pairs of cards. Find all matches before time runs out!";
pub const GAME_THUMBNAIL: &str = "/arcade/games/memoryMatch/thumbnail.jpg";

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
/// How long a mismatched pair stays face up before flipping back.
pub const MISMATCH_DELAY: Duration = Duration::from_millis(1100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Board size and time budget for a difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultySettings {
    pub pairs: usize,
    pub time_limit_secs: u32,
}

impl Difficulty {
    pub fn settings(self) -> DifficultySettings {
        let (pairs, time_limit_secs) = match self {
            Self::Easy => (6, 60),
            Self::Medium => (8, 60),
            Self::Hard => (12, 90),
        };
        DifficultySettings {
            pairs,
            time_limit_secs,
        }
    }
}

/// Where the board is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No board dealt; difficulty may change.
    #[default]
    Idle,
    /// Board live, no card selected.
    Dealt,
    /// One card face up, waiting for its partner.
    Selecting,
    /// Mismatched pair showing; the board is locked until it flips back.
    Resolving,
    Won,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryTimer {
    Countdown,
    FlipBack,
}

/// Result of a card click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Ignored,
    FirstPick,
    Match,
    Mismatch,
    Won { score: i64 },
}

/// Serializable session state handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub difficulty: Difficulty,
    pub phase: Phase,
    pub cards: Vec<Card>,
    pub moves: u32,
    pub matched_pairs: u32,
    pub total_pairs: u32,
    pub remaining_secs: u32,
    pub first: Option<usize>,
    pub second: Option<usize>,
    pub running: bool,
    pub message: String,
    /// Score of the last won board.
    pub score: Option<i64>,
}

impl MemoryState {
    fn idle(difficulty: Difficulty) -> Self {
        let settings = difficulty.settings();
        Self {
            difficulty,
            phase: Phase::Idle,
            cards: Vec::new(),
            moves: 0,
            matched_pairs: 0,
            total_pairs: settings.pairs as u32,
            remaining_secs: settings.time_limit_secs,
            first: None,
            second: None,
            running: false,
            message: String::new(),
            score: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.phase == Phase::Resolving
    }
}

/// Player input, encoded with `rmp-serde`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryInput {
    SelectDifficulty(Difficulty),
    Start,
    Reset,
    Flip { index: usize },
}

/// The Memory Match card game, implementing `ArcadeGame`.
pub struct MemoryMatch {
    state: MemoryState,
    mount: MountPoint,
    timers: Scheduler<MemoryTimer>,
    rng: StdRng,
}

impl MemoryMatch {
    pub fn new(mount: MountPoint) -> Self {
        Self::with_rng(mount, StdRng::from_os_rng())
    }

    /// Deterministic deck order for tests and replays.
    pub fn with_seed(mount: MountPoint, seed: u64) -> Self {
        Self::with_rng(mount, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mount: MountPoint, rng: StdRng) -> Self {
        Self {
            state: MemoryState::idle(Difficulty::default()),
            mount,
            timers: Scheduler::new(),
            rng,
        }
    }

    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    /// Choose the board size. Rejected while a board is in play.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.state.running {
            return false;
        }
        let settings = difficulty.settings();
        self.state.difficulty = difficulty;
        self.state.total_pairs = settings.pairs as u32;
        self.state.remaining_secs = settings.time_limit_secs;
        true
    }

    /// Deal a fresh board and start the clock. Returns false if a board is
    /// already in play.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            return false;
        }
        let difficulty = self.state.difficulty;
        let settings = difficulty.settings();
        self.state = MemoryState::idle(difficulty);
        self.state.cards = deal(settings.pairs, &mut self.rng);
        self.state.phase = Phase::Dealt;
        self.state.running = true;

        self.timers.cancel_all();
        self.timers.every(COUNTDOWN_PERIOD, MemoryTimer::Countdown);
        tracing::debug!(game = GAME_ID, ?difficulty, "Board dealt");
        true
    }

    /// Click card `index`.
    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        if !self.state.running || self.state.is_locked() {
            return FlipOutcome::Ignored;
        }
        match self.state.cards.get(index) {
            Some(card) if card.state == CardState::FaceDown => {},
            _ => return FlipOutcome::Ignored,
        }
        self.state.cards[index].state = CardState::FaceUp;

        let Some(first) = self.state.first else {
            self.state.first = Some(index);
            self.state.phase = Phase::Selecting;
            return FlipOutcome::FirstPick;
        };

        self.state.second = Some(index);
        self.state.moves += 1;

        if self.state.cards[first].face == self.state.cards[index].face {
            self.state.cards[first].state = CardState::Matched;
            self.state.cards[index].state = CardState::Matched;
            self.state.matched_pairs += 1;
            self.state.first = None;
            self.state.second = None;

            if self.state.matched_pairs == self.state.total_pairs {
                return self.win();
            }
            self.state.phase = Phase::Dealt;
            FlipOutcome::Match
        } else {
            self.state.phase = Phase::Resolving;
            self.timers.after(MISMATCH_DELAY, MemoryTimer::FlipBack);
            FlipOutcome::Mismatch
        }
    }

    fn win(&mut self) -> FlipOutcome {
        self.timers.cancel_all();
        self.state.running = false;
        self.state.phase = Phase::Won;
        let score = calculate_score(self.state.remaining_secs, self.state.moves);
        self.state.score = Some(score);
        self.state.message = format!(
            "Congratulations! You found all matches in {} moves. Score: {score}",
            self.state.moves
        );
        tracing::info!(game = GAME_ID, moves = self.state.moves, score, "Board cleared");
        FlipOutcome::Won { score }
    }

    fn time_out(&mut self) -> GameEvent {
        self.timers.cancel_all();
        self.state.running = false;
        self.state.phase = Phase::TimedOut;
        self.state.message = format!(
            "Time's up! You found {} out of {} pairs.",
            self.state.matched_pairs, self.state.total_pairs
        );
        tracing::info!(
            game = GAME_ID,
            matched = self.state.matched_pairs,
            total = self.state.total_pairs,
            "Out of time"
        );
        GameEvent::Finished {
            score: None,
            message: self.state.message.clone(),
        }
    }

    /// Stop the clock, clear the board, and return to `Idle`.
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        self.state = MemoryState::idle(self.state.difficulty);
    }

    fn on_timer(&mut self, fired: Fired<MemoryTimer>) -> Vec<GameEvent> {
        match fired.kind {
            MemoryTimer::Countdown => {
                self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
                let mut events = vec![GameEvent::TimeRemaining {
                    seconds: self.state.remaining_secs,
                }];
                if self.state.remaining_secs == 0
                    && self.state.matched_pairs < self.state.total_pairs
                {
                    events.push(self.time_out());
                }
                events
            },
            MemoryTimer::FlipBack => {
                for index in [self.state.first.take(), self.state.second.take()]
                    .into_iter()
                    .flatten()
                {
                    if let Some(card) = self.state.cards.get_mut(index)
                        && card.state == CardState::FaceUp
                    {
                        card.state = CardState::FaceDown;
                    }
                }
                self.state.phase = Phase::Dealt;
                Vec::new()
            },
        }
    }
}

impl ArcadeGame for MemoryMatch {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: GAME_NAME.to_string(),
            description: GAME_DESCRIPTION.to_string(),
            round_duration: Duration::from_secs(u64::from(
                self.state.difficulty.settings().time_limit_secs,
            )),
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
        let Some(input) = decode_input::<MemoryInput>(GAME_ID, input) else {
            return Vec::new();
        };
        match input {
            MemoryInput::SelectDifficulty(difficulty) => {
                self.select_difficulty(difficulty);
                Vec::new()
            },
            MemoryInput::Start => {
                if self.start() {
                    vec![GameEvent::TimeRemaining {
                        seconds: self.state.remaining_secs,
                    }]
                } else {
                    Vec::new()
                }
            },
            MemoryInput::Reset => {
                self.reset();
                Vec::new()
            },
            MemoryInput::Flip { index } => match self.flip(index) {
                FlipOutcome::Won { score } => vec![GameEvent::Finished {
                    score: Some(score),
                    message: self.state.message.clone(),
                }],
                _ => Vec::new(),
            },
        }
    }

    fn destroy(&mut self) -> Result<(), GameError> {
        self.timers.cancel_all();
        self.state.running = false;
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
            Box::new(MemoryMatch::new(mount.clone()))
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use arcade_core::engine::ArcadeEngine;
    use arcade_core::stats::MemoryStore;
    use arcade_core::test_helpers::{
        contract_countdown_finishes, contract_destroy_stops_timers, contract_garbage_input_ignored,
        contract_new_game_is_idle, contract_start_input_runs, finished_score, run_for,
    };

    fn game(difficulty: Difficulty) -> MemoryMatch {
        let mut g = MemoryMatch::with_seed(MountPoint::default(), 42);
        assert!(g.select_difficulty(difficulty));
        g
    }

    fn encode(input: &MemoryInput) -> Vec<u8> {
        rmp_serde::to_vec(input).unwrap()
    }

    /// Index pairs sharing a face, in deck order of the first card.
    fn pairs(state: &MemoryState) -> Vec<(usize, usize)> {
        let mut by_face: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, card) in state.cards.iter().enumerate() {
            by_face.entry(card.face.as_str()).or_default().push(i);
        }
        let mut pairs: Vec<(usize, usize)> = by_face.values().map(|v| (v[0], v[1])).collect();
        pairs.sort_unstable();
        pairs
    }

    fn mismatched(state: &MemoryState) -> (usize, usize) {
        let first = 0;
        let other = (1..state.cards.len())
            .find(|&i| state.cards[i].face != state.cards[first].face)
            .unwrap();
        (first, other)
    }

    #[test]
    fn contract_suite() {
        let mut g = game(Difficulty::Easy);
        contract_new_game_is_idle(&g);
        contract_garbage_input_ignored(&mut g);
        contract_start_input_runs(&mut g, &encode(&MemoryInput::Start));
        contract_countdown_finishes(&mut g, 65);

        let mut g = game(Difficulty::Hard);
        g.start();
        contract_destroy_stops_timers(&mut g);
    }

    #[test]
    fn difficulty_table() {
        assert_eq!(
            Difficulty::Easy.settings(),
            DifficultySettings {
                pairs: 6,
                time_limit_secs: 60
            }
        );
        assert_eq!(Difficulty::Medium.settings().pairs, 8);
        assert_eq!(Difficulty::Hard.settings().pairs, 12);
        assert_eq!(Difficulty::Hard.settings().time_limit_secs, 90);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn start_deals_board_for_difficulty() {
        let mut g = game(Difficulty::Hard);
        assert!(g.start());
        assert_eq!(g.state().cards.len(), 24);
        assert_eq!(g.state().remaining_secs, 90);
        assert_eq!(g.state().phase, Phase::Dealt);
        assert!(!g.start());
    }

    #[test]
    fn metadata_tracks_difficulty() {
        let mut g = game(Difficulty::Hard);
        assert_eq!(g.metadata().name, GAME_NAME);
        assert_eq!(g.metadata().round_duration, Duration::from_secs(90));
        g.select_difficulty(Difficulty::Easy);
        assert_eq!(g.metadata().round_duration, Duration::from_secs(60));
        assert_eq!(g.mount_point(), &MountPoint::default());
    }

    #[test]
    fn difficulty_locked_while_running() {
        let mut g = game(Difficulty::Easy);
        g.start();
        assert!(!g.select_difficulty(Difficulty::Hard));
        assert_eq!(g.state().difficulty, Difficulty::Easy);
        g.reset();
        assert!(g.select_difficulty(Difficulty::Hard));
    }

    #[test]
    fn perfect_easy_board_scores_1520() {
        let mut g = game(Difficulty::Easy);
        g.start();
        g.update(Duration::from_secs(5));
        assert_eq!(g.state().remaining_secs, 55);

        let pairs = pairs(g.state());
        assert_eq!(pairs.len(), 6);
        let mut outcome = FlipOutcome::Ignored;
        for (a, b) in pairs {
            assert_eq!(g.flip(a), FlipOutcome::FirstPick);
            outcome = g.flip(b);
        }
        assert_eq!(outcome, FlipOutcome::Won { score: 1520 });
        assert_eq!(g.state().moves, 6);
        assert_eq!(g.state().phase, Phase::Won);
        assert_eq!(g.state().score, Some(1520));
        assert_eq!(
            g.state().message,
            "Congratulations! You found all matches in 6 moves. Score: 1520"
        );
        assert!(run_for(&mut g, 120).is_empty(), "clock must stop on a win");
    }

    #[test]
    fn mismatch_locks_then_flips_back() {
        let mut g = game(Difficulty::Easy);
        g.start();
        let (a, b) = mismatched(g.state());

        assert_eq!(g.flip(a), FlipOutcome::FirstPick);
        assert_eq!(g.state().moves, 0, "first pick is not a move");
        assert_eq!(g.flip(b), FlipOutcome::Mismatch);
        assert_eq!(g.state().moves, 1);
        assert!(g.state().is_locked());

        let third = (0..g.state().cards.len()).find(|&i| i != a && i != b).unwrap();
        assert_eq!(g.flip(third), FlipOutcome::Ignored);

        g.update(MISMATCH_DELAY);
        assert!(!g.state().is_locked());
        assert_eq!(g.state().cards[a].state, CardState::FaceDown);
        assert_eq!(g.state().cards[b].state, CardState::FaceDown);
        assert_eq!(g.state().cards[third].state, CardState::FaceDown);
        assert_eq!(g.state().matched_pairs, 0);
        assert_eq!(g.state().phase, Phase::Dealt);
    }

    #[test]
    fn same_card_twice_is_ignored() {
        let mut g = game(Difficulty::Easy);
        g.start();
        assert_eq!(g.flip(3), FlipOutcome::FirstPick);
        assert_eq!(g.flip(3), FlipOutcome::Ignored);
        assert_eq!(g.state().moves, 0);
        assert_eq!(g.state().phase, Phase::Selecting);
    }

    #[test]
    fn matched_cards_stay_out_of_play() {
        let mut g = game(Difficulty::Easy);
        g.start();
        let (a, b) = pairs(g.state())[0];
        g.flip(a);
        assert_eq!(g.flip(b), FlipOutcome::Match);
        assert_eq!(g.state().matched_pairs, 1);
        assert_eq!(g.flip(a), FlipOutcome::Ignored);
        assert_eq!(g.flip(b), FlipOutcome::Ignored);
        assert_eq!(g.state().cards[a].state, CardState::Matched);
    }

    #[test]
    fn out_of_range_and_idle_clicks_ignored() {
        let mut g = game(Difficulty::Easy);
        assert_eq!(g.flip(0), FlipOutcome::Ignored);
        g.start();
        assert_eq!(g.flip(999), FlipOutcome::Ignored);
    }

    #[test]
    fn timeout_reports_no_score() {
        let mut g = game(Difficulty::Easy);
        g.start();
        let (a, b) = pairs(g.state())[0];
        g.flip(a);
        g.flip(b);

        let events = run_for(&mut g, 60);
        assert_eq!(finished_score(&events), Some(None));
        assert_eq!(g.state().phase, Phase::TimedOut);
        assert_eq!(g.state().message, "Time's up! You found 1 out of 6 pairs.");
        assert!(!g.state().running);
        assert_eq!(g.flip(2), FlipOutcome::Ignored);
    }

    #[test]
    fn timeout_while_resolving_cancels_flip_back() {
        let mut g = game(Difficulty::Easy);
        g.start();
        g.update(Duration::from_millis(59_500));
        let (a, b) = mismatched(g.state());
        g.flip(a);
        g.flip(b);
        let events = g.update(Duration::from_secs(2));
        assert_eq!(finished_score(&events), Some(None));
        assert_eq!(g.state().cards[a].state, CardState::FaceUp);
        assert!(g.update(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut g = game(Difficulty::Medium);
        g.start();
        g.flip(0);
        g.update(Duration::from_secs(3));
        g.reset();
        assert_eq!(g.state().phase, Phase::Idle);
        assert!(g.state().cards.is_empty());
        assert_eq!(g.state().moves, 0);
        assert_eq!(g.state().remaining_secs, 60);
        assert!(run_for(&mut g, 100).is_empty());
    }

    #[test]
    fn win_through_engine_sets_high_score() {
        let mut engine = ArcadeEngine::new(Box::new(MemoryStore::new()));
        engine.register(registration()).unwrap();
        engine.launch(GAME_ID).unwrap();
        engine
            .apply_input(&encode(&MemoryInput::SelectDifficulty(Difficulty::Easy)))
            .unwrap();
        engine.apply_input(&encode(&MemoryInput::Start)).unwrap();
        engine.update(Duration::from_secs(5));

        let state: MemoryState = rmp_serde::from_slice(&engine.active_state().unwrap()).unwrap();
        let mut finished = Vec::new();
        for (a, b) in pairs(&state) {
            engine.apply_input(&encode(&MemoryInput::Flip { index: a })).unwrap();
            finished.extend(engine.apply_input(&encode(&MemoryInput::Flip { index: b })).unwrap());
        }
        assert_eq!(finished_score(&finished), Some(Some(1520)));
        assert_eq!(engine.game(GAME_ID).unwrap().high_score(), 1520);
    }
}
