pub mod engine;
pub mod events;
pub mod game_registry;
pub mod game_trait;
pub mod scheduler;
pub mod stats;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::game_registry::GameRegistration;
    use crate::game_trait::{ArcadeGame, GameError, GameEvent, GameMetadata, MountPoint};

    /// Shared counters observed by tests while the engine owns a [`StubGame`].
    #[derive(Debug, Clone, Default)]
    pub struct StubCounters {
        created: Arc<AtomicUsize>,
        destroyed: Arc<AtomicUsize>,
        inputs: Arc<AtomicUsize>,
        last_mount: Arc<Mutex<Option<String>>>,
        finish: Arc<Mutex<Option<Option<i64>>>>,
    }

    impl StubCounters {
        pub fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        pub fn destroyed(&self) -> usize {
            self.destroyed.load(Ordering::SeqCst)
        }

        pub fn inputs(&self) -> usize {
            self.inputs.load(Ordering::SeqCst)
        }

        pub fn last_mount(&self) -> Option<String> {
            self.last_mount.lock().unwrap().clone()
        }

        /// Make games created afterwards finish on their first update.
        pub fn finish_with(&self, score: Option<i64>) {
            *self.finish.lock().unwrap() = Some(score);
        }
    }

    /// Minimal game that records lifecycle calls.
    pub struct StubGame {
        counters: StubCounters,
        mount: MountPoint,
        fail_teardown: bool,
        finish: Option<Option<i64>>,
        running: bool,
    }

    impl ArcadeGame for StubGame {
        fn metadata(&self) -> GameMetadata {
            GameMetadata {
                name: "Stub".to_string(),
                description: "Records lifecycle calls".to_string(),
                round_duration: Duration::from_secs(1),
            }
        }

        fn mount_point(&self) -> &MountPoint {
            &self.mount
        }

        fn update(&mut self, _dt: Duration) -> Vec<GameEvent> {
            match self.finish.take() {
                Some(score) if self.running => {
                    self.running = false;
                    vec![GameEvent::Finished {
                        score,
                        message: "stub finished".to_string(),
                    }]
                },
                _ => Vec::new(),
            }
        }

        fn apply_input(&mut self, _input: &[u8]) -> Vec<GameEvent> {
            self.counters.inputs.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }

        fn serialize_state(&self) -> Vec<u8> {
            vec![u8::from(self.running)]
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn destroy(&mut self) -> Result<(), GameError> {
            self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
            self.running = false;
            if self.fail_teardown {
                return Err(GameError::Teardown("stub teardown failure".to_string()));
            }
            Ok(())
        }
    }

    /// Registration for a stub game whose calls are not observed.
    pub fn stub_registration(id: &str) -> GameRegistration {
        stub_registration_with(id, &StubCounters::default(), false)
    }

    /// Registration for a stub game reporting into `counters`.
    pub fn stub_registration_with(
        id: &str,
        counters: &StubCounters,
        fail_teardown: bool,
    ) -> GameRegistration {
        let counters = counters.clone();
        GameRegistration::new(
            id,
            format!("Stub {id}"),
            "A stub game",
            format!("/games/{id}/thumbnail.jpg"),
            move |mount: &MountPoint| -> Box<dyn ArcadeGame> {
                counters.created.fetch_add(1, Ordering::SeqCst);
                *counters.last_mount.lock().unwrap() = Some(mount.0.clone());
                let finish = *counters.finish.lock().unwrap();
                Box::new(StubGame {
                    counters: counters.clone(),
                    mount: mount.clone(),
                    fail_teardown,
                    finish,
                    running: true,
                })
            },
        )
    }

    /// Advance `game` one second at a time for `seconds`, collecting events.
    pub fn run_for(game: &mut dyn ArcadeGame, seconds: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..seconds {
            events.extend(game.update(Duration::from_secs(1)));
        }
        events
    }

    /// Score carried by the first `Finished` event, if any.
    pub fn finished_score(events: &[GameEvent]) -> Option<Option<i64>> {
        events.iter().find_map(|e| match e {
            GameEvent::Finished { score, .. } => Some(*score),
            _ => None,
        })
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Every ArcadeGame implementation must pass these. Game crates call
    // them from their own #[cfg(test)] modules with a fresh instance and
    // the encoded input that starts a session.

    /// A fresh instance is idle and produces a non-empty snapshot.
    pub fn contract_new_game_is_idle(game: &dyn ArcadeGame) {
        assert!(!game.is_running(), "a new game must not be running");
        assert!(
            !game.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes"
        );
    }

    /// The start input begins a session and changes the snapshot.
    pub fn contract_start_input_runs(game: &mut dyn ArcadeGame, start_input: &[u8]) {
        let before = game.serialize_state();
        game.apply_input(start_input);
        assert!(game.is_running(), "start input must begin a session");
        assert_ne!(before, game.serialize_state(), "starting must change state");
    }

    /// Without any play, the countdown must end the session within
    /// `max_seconds`, emitting exactly one `Finished`.
    pub fn contract_countdown_finishes(game: &mut dyn ArcadeGame, max_seconds: u32) {
        let events = run_for(game, max_seconds);
        let finished = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Finished { .. }))
            .count();
        assert_eq!(finished, 1, "countdown must finish exactly once");
        assert!(!game.is_running(), "game must stop after finishing");
    }

    /// After `destroy`, no timer may fire: updates produce no events.
    pub fn contract_destroy_stops_timers(game: &mut dyn ArcadeGame) {
        game.destroy().expect("destroy must succeed");
        let after = run_for(game, 120);
        assert!(after.is_empty(), "no events may fire after destroy: {after:?}");
        assert!(!game.is_running());
    }

    /// Undecodable input is ignored.
    pub fn contract_garbage_input_ignored(game: &mut dyn ArcadeGame) {
        let before = game.serialize_state();
        let events = game.apply_input(&[0xc1, 0x00, 0xff]);
        assert!(events.is_empty());
        assert_eq!(before, game.serialize_state());
    }
}
