//! Session controller
//!
//! Owns the game state, the clock and the adapters, and is the only way in:
//! player input ([`Session::hit`], [`Session::toggle_pause`], ...) and the
//! passage of time ([`Session::advance`]). Each entry point runs to
//! completion and then flushes the events it produced to the presenter and
//! cue player.
//!
//! Pausing freezes live targets but does not remember their remaining time;
//! resuming forfeits them and starts spawning afresh.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::CuePlayer;
use crate::error::Result;
use crate::levels::{LevelCatalog, LevelChoice, LevelDefinition};
use crate::presentation::Presenter;
use crate::records::{RecordStore, RecordUpdate, Records};
use crate::settings::Settings;
use crate::sim::{
    Cell, GameEvent, GamePhase, GameState, Millis, Resolution, Task, TimerId, Timers, resolver,
    spawner,
};
use crate::tuning::Tuning;

/// Everything needed to build a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tuning: Tuning,
    pub level: LevelChoice,
    pub seed: u64,
}

impl SessionConfig {
    /// Config from player settings; `fallback_seed` is used when the
    /// settings don't pin one.
    pub fn from_settings(settings: &Settings, fallback_seed: u64) -> Self {
        Self {
            tuning: settings.tuning(),
            level: settings.level.clone(),
            seed: settings.seed.unwrap_or(fallback_seed),
        }
    }
}

/// One player's game, from intro screen through any number of resets
pub struct Session<P: Presenter, C: CuePlayer, S: RecordStore> {
    state: GameState,
    timers: Timers,
    rng: Pcg32,
    tuning: Tuning,
    catalog: LevelCatalog,
    level_choice: LevelChoice,
    level: LevelDefinition,
    records: Records,
    /// The one pending spawner tick, if the loop is running
    spawn_timer: Option<TimerId>,
    events: Vec<GameEvent>,
    presenter: P,
    cues: C,
    store: S,
}

impl<P: Presenter, C: CuePlayer, S: RecordStore> Session<P, C, S> {
    /// Build a session sitting on the intro screen
    pub fn new(config: SessionConfig, presenter: P, cues: C, store: S) -> Result<Self> {
        config.tuning.validate()?;

        let mut rng = Pcg32::seed_from_u64(config.seed);
        let catalog = LevelCatalog::builtin();
        let level = catalog.choose(&config.level, &mut rng)?;
        let records = Records::load(&store);

        let mut session = Self {
            state: GameState::new(&config.tuning, GamePhase::Intro),
            timers: Timers::new(),
            rng,
            tuning: config.tuning,
            catalog,
            level_choice: config.level,
            level,
            records,
            spawn_timer: None,
            events: Vec::new(),
            presenter,
            cues,
            store,
        };

        session.events.push(GameEvent::ShowLevel(session.level.clone()));
        session.push_intro_stats();
        session.flush();

        log::info!("Session ready (seed {})", config.seed);
        Ok(session)
    }

    // === Accessors ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn level(&self) -> &LevelDefinition {
        &self.level
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn records(&self) -> Records {
        self.records
    }

    /// Current virtual time (ms)
    pub fn now(&self) -> Millis {
        self.timers.now()
    }

    /// Whether the spawner loop has a tick queued
    pub fn spawner_running(&self) -> bool {
        self.spawn_timer
            .is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn cues(&self) -> &C {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut C {
        &mut self.cues
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // === Transitions ===

    /// Leave the intro screen and start the first game
    pub fn start(&mut self) {
        self.cues.resume();
        self.events.push(GameEvent::IntroDismissed);
        self.reset();
    }

    /// Throw away the current game and start a fresh one
    pub fn reset(&mut self) {
        self.events.push(GameEvent::AmbientStop);

        // Old expiries must never fire into the new game
        self.timers.clear();
        self.spawn_timer = None;

        match self.catalog.choose(&self.level_choice, &mut self.rng) {
            Ok(level) => self.level = level,
            Err(e) => log::warn!("Keeping level '{}': {}", self.level.name, e),
        }

        self.state = GameState::new(&self.tuning, GamePhase::Playing);

        self.events.push(GameEvent::ShowLevel(self.level.clone()));
        self.events.push(GameEvent::ResetBoard);
        self.events.push(GameEvent::Paused(false));
        self.push_scoreboard();
        self.events.push(GameEvent::AmbientTempo(1.0));
        self.events.push(GameEvent::AmbientStart);

        self.arm_spawner(self.tuning.first_spawn_delay_ms);

        log::info!(
            "New game on '{}' ({} cells)",
            self.level.name,
            self.level.cell_count()
        );
        self.flush();
    }

    /// Pause if playing, resume if paused; ignored otherwise
    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            GamePhase::Intro | GamePhase::GameOver => {}
        }
    }

    /// Freeze the game. Live targets stay live, but their countdowns stop.
    pub fn pause(&mut self) {
        if self.state.phase != GamePhase::Playing {
            return;
        }
        self.state.phase = GamePhase::Paused;

        self.state.freeze_targets(&mut self.timers);
        self.stop_spawner();

        self.events.push(GameEvent::AmbientStop);
        self.events.push(GameEvent::Paused(true));
        log::info!("Paused with {} live targets", self.state.active_count());
        self.flush();
    }

    /// Unfreeze the game. Targets frozen by the pause are forfeited, not
    /// restored, and the spawner starts over.
    pub fn resume(&mut self) {
        if self.state.phase != GamePhase::Paused {
            return;
        }
        self.state.phase = GamePhase::Playing;

        self.state.forfeit_cells(&mut self.timers);
        for i in 0..self.level.cell_count() {
            self.events.push(GameEvent::CellCleared(Cell(i)));
        }

        self.events.push(GameEvent::Paused(false));
        self.events.push(GameEvent::AmbientStart);
        log::info!("Resumed");

        self.run_spawner();
        self.flush();
    }

    // === Input ===

    /// Player struck cell `index`
    pub fn hit(&mut self, index: usize) -> Resolution {
        if index >= self.level.cell_count() {
            log::warn!(
                "Ignoring hit on cell {} (grid has {})",
                index,
                self.level.cell_count()
            );
            return Resolution::Ignored;
        }

        let resolution = resolver::hit(
            &mut self.state,
            Cell(index),
            &mut self.timers,
            &self.tuning,
            &mut self.events,
        );
        if resolution.ends_session() {
            self.end();
        }
        self.flush();
        resolution
    }

    // === Time ===

    /// Let `dt` milliseconds pass, firing whatever comes due
    pub fn advance(&mut self, dt: Millis) {
        let target = self.timers.now().saturating_add(dt);
        self.advance_to(target);
    }

    /// Run the clock up to `t`, firing due tasks one at a time
    pub fn advance_to(&mut self, t: Millis) {
        while let Some((id, task)) = self.timers.pop_due(t) {
            self.dispatch(id, task);
        }
        self.timers.settle(t);
        self.flush();
    }

    fn dispatch(&mut self, id: TimerId, task: Task) {
        match task {
            Task::SpawnTick => {
                if self.spawn_timer == Some(id) {
                    self.spawn_timer = None;
                }
                self.run_spawner();
            }
            Task::Expire(cell) => {
                let resolution = resolver::miss(
                    &mut self.state,
                    cell,
                    &mut self.timers,
                    &self.tuning,
                    &mut self.events,
                );
                if resolution.ends_session() {
                    self.end();
                }
            }
            Task::Release(cell) => {
                resolver::release(&mut self.state, cell, &mut self.events);
            }
        }
    }

    // === Spawner loop ===

    fn run_spawner(&mut self) {
        let step = spawner::spawn_tick(
            &mut self.state,
            self.level.cell_count(),
            &mut self.timers,
            &mut self.rng,
            &self.tuning,
            &mut self.events,
        );
        match step.next_delay() {
            Some(delay) => self.arm_spawner(delay),
            None => self.stop_spawner(),
        }
    }

    /// Queue the next tick, replacing any tick already queued
    fn arm_spawner(&mut self, delay: Millis) {
        self.stop_spawner();
        self.spawn_timer = Some(self.timers.schedule(delay, Task::SpawnTick));
    }

    fn stop_spawner(&mut self) {
        if let Some(id) = self.spawn_timer.take() {
            self.timers.cancel(id);
        }
    }

    // === End ===

    /// Game over. Pending cooldown releases still run so resolved cells
    /// clear; nothing can expire or spawn again.
    fn end(&mut self) {
        self.state.phase = GamePhase::GameOver;
        self.state.freeze_targets(&mut self.timers);
        self.stop_spawner();

        let update = self.save_records();

        self.push_intro_stats();
        self.events.push(GameEvent::GameOver {
            score: self.state.score,
            max_combo: self.state.max_combo,
        });
        self.events.push(GameEvent::AmbientStop);
        self.events.push(GameEvent::EndPhrase);

        log::info!(
            "Game over: score {}, level {}, best combo {} ({} hits, {} misses, {} wrong){}",
            self.state.score,
            self.state.level,
            self.state.max_combo,
            self.state.hits,
            self.state.misses,
            self.state.wrong_hits,
            if update.any() { " - new record!" } else { "" }
        );
    }

    fn save_records(&mut self) -> RecordUpdate {
        self.records
            .submit(self.state.score, self.state.max_combo, &mut self.store)
    }

    // === Events ===

    fn push_scoreboard(&mut self) {
        self.events.push(GameEvent::Scoreboard {
            score: self.state.score,
            level: self.state.level,
            lives: self.state.lives,
        });
    }

    fn push_intro_stats(&mut self) {
        self.events.push(GameEvent::IntroStats {
            high_score: self.records.high_score,
            max_combo: self.records.max_combo,
        });
    }

    fn flush(&mut self) {
        for event in self.events.drain(..) {
            event.deliver(&mut self.presenter, &mut self.cues);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording adapters for session tests

    use crate::audio::{CuePlayer, Tone};
    use crate::levels::LevelDefinition;
    use crate::presentation::Presenter;
    use crate::sim::{Cell, GameEvent, Outcome};

    #[derive(Debug, Default)]
    pub struct RecordingPresenter {
        pub log: Vec<GameEvent>,
    }

    impl Presenter for RecordingPresenter {
        fn show_level(&mut self, level: &LevelDefinition) {
            self.log.push(GameEvent::ShowLevel(level.clone()));
        }
        fn reset_board(&mut self) {
            self.log.push(GameEvent::ResetBoard);
        }
        fn hide_intro(&mut self) {
            self.log.push(GameEvent::IntroDismissed);
        }
        fn show_intro_stats(&mut self, high_score: u64, max_combo: u32) {
            self.log.push(GameEvent::IntroStats {
                high_score,
                max_combo,
            });
        }
        fn mark_cell_occupied(&mut self, cell: Cell) {
            self.log.push(GameEvent::CellOccupied(cell));
        }
        fn mark_cell_resolved(&mut self, cell: Cell, outcome: Outcome) {
            self.log.push(GameEvent::CellResolved { cell, outcome });
        }
        fn clear_cell(&mut self, cell: Cell) {
            self.log.push(GameEvent::CellCleared(cell));
        }
        fn update_scoreboard(&mut self, score: u64, level: u32, lives: u8) {
            self.log.push(GameEvent::Scoreboard {
                score,
                level,
                lives,
            });
        }
        fn show_combo(&mut self, value: u32) {
            self.log.push(GameEvent::Combo(value));
        }
        fn show_wrong_hit_alert(&mut self) {
            self.log.push(GameEvent::WrongHitAlert);
        }
        fn show_paused(&mut self, paused: bool) {
            self.log.push(GameEvent::Paused(paused));
        }
        fn show_game_over(&mut self, score: u64, max_combo: u32) {
            self.log.push(GameEvent::GameOver { score, max_combo });
        }
    }

    impl RecordingPresenter {
        pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
            self.log.iter().filter(|e| pred(e)).count()
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingCues {
        pub log: Vec<GameEvent>,
        pub ambient_on: bool,
        pub tempo: f32,
    }

    impl CuePlayer for RecordingCues {
        fn play_tone(&mut self, tone: Tone) {
            self.log.push(GameEvent::Tone(tone));
        }
        fn start_ambient(&mut self) {
            self.ambient_on = true;
            self.log.push(GameEvent::AmbientStart);
        }
        fn stop_ambient(&mut self) {
            self.ambient_on = false;
            self.log.push(GameEvent::AmbientStop);
        }
        fn set_ambient_tempo(&mut self, multiplier: f32) {
            self.tempo = multiplier;
            self.log.push(GameEvent::AmbientTempo(multiplier));
        }
        fn play_end_phrase(&mut self) {
            self.ambient_on = false;
            self.log.push(GameEvent::EndPhrase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingCues, RecordingPresenter};
    use super::*;
    use crate::records::MemoryRecordStore;
    use crate::sim::Outcome;
    use proptest::prelude::*;

    type TestSession = Session<RecordingPresenter, RecordingCues, MemoryRecordStore>;

    fn config(seed: u64) -> SessionConfig {
        SessionConfig {
            tuning: Tuning::default(),
            level: LevelChoice::Named("Meadow".into()),
            seed,
        }
    }

    fn session_with_store(seed: u64, store: MemoryRecordStore) -> TestSession {
        Session::new(
            config(seed),
            RecordingPresenter::default(),
            RecordingCues::default(),
            store,
        )
        .unwrap()
    }

    fn session(seed: u64) -> TestSession {
        session_with_store(seed, MemoryRecordStore::new())
    }

    /// Started session with the first target already up
    fn playing(seed: u64) -> TestSession {
        let mut s = session(seed);
        s.start();
        s.advance(s.tuning().first_spawn_delay_ms);
        assert_eq!(s.state().active_count(), 1);
        s
    }

    fn live_cell(s: &TestSession) -> usize {
        s.state().active_cells().next().expect("a live target").0
    }

    fn empty_cell(s: &TestSession) -> usize {
        (0..s.level().cell_count())
            .find(|i| !s.state().is_active(Cell(*i)) && !s.state().is_busy(Cell(*i)))
            .expect("an empty cell")
    }

    /// Hit whatever is up, then wait out the cooldown and the next spawn
    fn hit_next(s: &mut TestSession) -> Resolution {
        let cell = live_cell(s);
        let r = s.hit(cell);
        while s.state().active_count() == 0 && s.phase() == GamePhase::Playing {
            s.advance(50);
        }
        r
    }

    #[test]
    fn test_intro_shows_records_and_ignores_input() {
        let mut store = MemoryRecordStore::new();
        store.set(Records::HIGH_SCORE_KEY, 340);
        store.set(Records::MAX_COMBO_KEY, 6);
        let mut s = session_with_store(1, store);

        assert_eq!(s.phase(), GamePhase::Intro);
        assert!(s.presenter().log.contains(&GameEvent::IntroStats {
            high_score: 340,
            max_combo: 6
        }));

        assert_eq!(s.hit(0), Resolution::Ignored);
        s.advance(10_000);
        assert_eq!(s.state().active_count(), 0);
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn test_unknown_level_fails_fast() {
        let cfg = SessionConfig {
            level: LevelChoice::Named("Atlantis".into()),
            ..config(1)
        };
        let result = Session::new(
            cfg,
            RecordingPresenter::default(),
            RecordingCues::default(),
            MemoryRecordStore::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_tuning_fails_fast() {
        let mut cfg = config(1);
        cfg.tuning.min_speed_ms = cfg.tuning.base_speed_ms + 1;
        assert!(
            Session::new(
                cfg,
                RecordingPresenter::default(),
                RecordingCues::default(),
                MemoryRecordStore::new(),
            )
            .is_err()
        );
    }

    #[test]
    fn test_custom_tuning_from_settings_is_validated() {
        let settings = Settings::from_json_or_default(
            r#"{ "level": { "Named": "Meadow" }, "custom_tuning": { "min_speed_ms": 5000 } }"#,
        );
        let result = Session::new(
            SessionConfig::from_settings(&settings, 1),
            RecordingPresenter::default(),
            RecordingCues::default(),
            MemoryRecordStore::new(),
        );
        assert!(matches!(result, Err(crate::InitError::InvalidTuning(_))));

        let settings = Settings::from_json_or_default(r#"{ "custom_tuning": { "cooldown_ms": 120 } }"#);
        let s = Session::new(
            SessionConfig::from_settings(&settings, 1),
            RecordingPresenter::default(),
            RecordingCues::default(),
            MemoryRecordStore::new(),
        )
        .unwrap();
        assert_eq!(s.tuning().cooldown_ms, 120);
    }

    #[test]
    fn test_start_spawns_after_delay() {
        let mut s = session(3);
        s.start();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert!(s.cues().ambient_on);
        assert_eq!(s.cues().tempo, 1.0);

        s.advance(s.tuning().first_spawn_delay_ms - 1);
        assert_eq!(s.state().active_count(), 0);
        s.advance(1);
        assert_eq!(s.state().active_count(), 1);
        assert!(s.spawner_running());
    }

    #[test]
    fn test_three_hits_then_miss_scoring() {
        let mut s = playing(11);
        hit_next(&mut s);
        hit_next(&mut s);
        hit_next(&mut s);
        assert_eq!(s.state().score, 60);
        assert_eq!(s.state().max_combo, 3);

        // Let the current target expire
        let lifetime = s.state().speed;
        s.advance(lifetime);
        assert_eq!(s.state().combo, 0);
        assert_eq!(s.state().lives, 2);

        while s.state().active_count() == 0 {
            s.advance(50);
        }
        assert!(matches!(hit_next(&mut s), Resolution::Hit { points: 10, .. }));
        assert_eq!(s.state().score, 70);
        assert_eq!(s.state().max_combo, 3);
    }

    #[test]
    fn test_expiry_costs_a_life_and_cools_the_cell() {
        let mut s = playing(5);
        let cell = live_cell(&s);
        s.advance(s.state().speed);

        assert_eq!(s.state().lives, 2);
        assert!(s.state().is_busy(Cell(cell)));
        assert!(s.presenter().log.contains(&GameEvent::CellResolved {
            cell: Cell(cell),
            outcome: Outcome::Miss
        }));

        s.advance(s.tuning().cooldown_ms);
        assert!(!s.state().is_busy(Cell(cell)));
        assert!(s.presenter().log.contains(&GameEvent::CellCleared(Cell(cell))));
    }

    #[test]
    fn test_each_target_resolves_once() {
        let mut s = playing(21);
        for round in 0..40 {
            if round % 3 == 0 {
                s.advance(s.state().speed);
            } else if s.state().active_count() > 0 {
                s.hit(live_cell(&s));
            }
            s.advance(200);
            if s.phase() == GamePhase::GameOver {
                break;
            }
        }
        let spawned = s.presenter().count(|e| matches!(e, GameEvent::CellOccupied(_)));
        let resolved = s
            .presenter()
            .count(|e| matches!(e, GameEvent::CellResolved { .. }));
        assert!(spawned > 0);
        assert_eq!(spawned, resolved + s.state().active_count());
    }

    #[test]
    fn test_three_wrong_hits_end_the_game() {
        let mut s = playing(8);
        for _ in 0..3 {
            let cell = empty_cell(&s);
            s.hit(cell);
        }
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.state().lives, 0);
        assert_eq!(s.pending_timers(), 0);
        assert!(!s.cues().ambient_on);
        assert_eq!(s.cues().log.last(), Some(&GameEvent::EndPhrase));
        assert!(s.presenter().log.contains(&GameEvent::GameOver {
            score: 0,
            max_combo: 0
        }));

        // Terminal until reset: the stranded target never expires
        let stranded = s.state().active_count();
        let cell = empty_cell(&s);
        assert_eq!(s.hit(cell), Resolution::Ignored);
        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::GameOver);
        s.advance(60_000);
        assert_eq!(s.state().active_count(), stranded);
        assert_eq!(s.state().lives, 0);
    }

    #[test]
    fn test_cooldown_finishes_after_game_over() {
        let mut s = playing(16);
        let cell = live_cell(&s);
        assert!(matches!(s.hit(cell), Resolution::Hit { .. }));
        for _ in 0..3 {
            let empty = empty_cell(&s);
            s.hit(empty);
        }
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert!(s.state().is_busy(Cell(cell)));
        assert!(!s.spawner_running());
        assert_eq!(s.pending_timers(), 1);

        s.advance(s.tuning().cooldown_ms);
        assert!(!s.state().is_busy(Cell(cell)));
        assert!(s.presenter().log.contains(&GameEvent::CellCleared(Cell(cell))));
        assert_eq!(s.pending_timers(), 0);
        assert_eq!(s.state().active_count(), 0);
    }

    #[test]
    fn test_game_over_saves_only_better_records() {
        let mut store = MemoryRecordStore::new();
        store.set(Records::HIGH_SCORE_KEY, 1_000);
        let mut s = session_with_store(4, store);
        s.start();
        s.advance(500);
        hit_next(&mut s);
        hit_next(&mut s);
        for _ in 0..3 {
            let cell = empty_cell(&s);
            s.hit(cell);
        }
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.store().get(Records::HIGH_SCORE_KEY), 1_000);
        assert_eq!(s.store().get(Records::MAX_COMBO_KEY), 2);
        assert_eq!(s.records().max_combo, 2);

        // A better run on the next reset overwrites it
        s.reset();
        s.advance(500);
        for _ in 0..14 {
            hit_next(&mut s);
        }
        for _ in 0..3 {
            let cell = empty_cell(&s);
            s.hit(cell);
        }
        assert_eq!(s.state().score, 5 * 14 * 15);
        assert_eq!(s.store().get(Records::HIGH_SCORE_KEY), 1_050);
        assert!(s.presenter().log.contains(&GameEvent::IntroStats {
            high_score: 1_050,
            max_combo: 14
        }));
    }

    #[test]
    fn test_pause_freezes_targets() {
        let mut s = playing(9);
        let cell = live_cell(&s);

        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::Paused);
        assert!(!s.cues().ambient_on);
        assert!(!s.spawner_running());

        // Nothing expires or spawns while paused
        s.advance(60_000);
        assert_eq!(s.state().lives, 3);
        assert!(s.state().is_active(Cell(cell)));
        assert_eq!(s.state().active_count(), 1);

        // Hits are ignored while paused
        assert_eq!(s.hit(cell), Resolution::Ignored);
        assert_eq!(s.state().score, 0);
    }

    #[test]
    fn test_resume_forfeits_frozen_targets() {
        let mut s = playing(10);
        let cell = live_cell(&s);
        s.hit(cell);
        s.advance(100);
        assert!(s.state().is_busy(Cell(cell)));

        s.pause();
        s.resume();

        assert_eq!(s.phase(), GamePhase::Playing);
        assert!(s.cues().ambient_on);
        assert_eq!(s.state().busy_cells().count(), 0);
        // The spawner restarted immediately with one fresh target;
        // the cooldown release was dropped
        assert_eq!(s.state().active_count(), 1);
        assert!(s.spawner_running());
        assert_eq!(s.pending_timers(), 2);
        // Score survives the pause
        assert_eq!(s.state().score, 10);

        // Frozen targets are forfeited, not resumed
        s.pause();
        let frozen = live_cell(&s);
        s.resume();
        assert_eq!(s.state().lives, 3);
        assert_eq!(s.state().active_count(), 1);
        assert!(s.presenter().log.contains(&GameEvent::CellCleared(Cell(frozen))));
    }

    #[test]
    fn test_quick_pause_resume_keeps_one_spawner_loop() {
        let mut s = playing(12);
        for _ in 0..5 {
            s.toggle_pause();
            s.toggle_pause();
        }
        // Exactly one spawn tick queued plus one expiry
        assert!(s.spawner_running());
        assert_eq!(s.pending_timers(), 2);
    }

    #[test]
    fn test_reset_cancels_previous_session_timers() {
        let mut s = playing(13);
        let cell = live_cell(&s);
        s.hit(cell);
        s.reset();

        assert_eq!(s.state().score, 0);
        assert_eq!(s.state().lives, 3);
        assert_eq!(s.state().active_count(), 0);
        assert_eq!(s.state().busy_cells().count(), 0);
        // Only the first spawn tick remains
        assert_eq!(s.pending_timers(), 1);
        s.advance(s.tuning().first_spawn_delay_ms);
        assert_eq!(s.state().active_count(), 1);
        assert_eq!(s.state().lives, 3);
    }

    #[test]
    fn test_tempo_follows_level() {
        let mut s = playing(14);
        for _ in 0..4 {
            hit_next(&mut s);
        }
        assert_eq!(s.state().level, 2);
        assert!((s.cues().tempo - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_hit_is_ignored() {
        let mut s = playing(15);
        assert_eq!(s.hit(99), Resolution::Ignored);
        assert_eq!(s.state().lives, 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Hit(usize),
        HitLive,
        Advance(u64),
        TogglePause,
        Reset,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            2 => (0usize..9).prop_map(Op::Hit),
            4 => Just(Op::HitLive),
            4 => (1u64..2_000).prop_map(Op::Advance),
            1 => Just(Op::TogglePause),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold(seed in any::<u64>(), ops in prop::collection::vec(op(), 1..120)) {
            let mut s = session(seed);
            s.start();
            let mut last_level = 1;
            let mut last_max_combo = 0;

            for op in ops {
                match op {
                    Op::Hit(i) => { s.hit(i); }
                    Op::HitLive => {
                        let live = s.state().active_cells().next();
                        if let Some(cell) = live {
                            s.hit(cell.0);
                        }
                    }
                    Op::Advance(ms) => s.advance(ms),
                    Op::TogglePause => s.toggle_pause(),
                    Op::Reset => {
                        s.reset();
                        last_level = 1;
                        last_max_combo = 0;
                    }
                }

                let st = s.state();
                let tuning = s.tuning();
                prop_assert!(st.lives <= tuning.starting_lives);
                prop_assert!(st.combo <= st.max_combo);
                prop_assert!(st.max_combo >= last_max_combo);
                prop_assert!(st.level >= last_level);
                prop_assert_eq!(st.level, tuning.level_for_score(st.score));
                prop_assert_eq!(st.speed, tuning.speed_for_level(st.level));
                prop_assert!(st.speed >= tuning.min_speed_ms);
                prop_assert!(st.active_cells().all(|c| !st.is_busy(c)));
                prop_assert!(st.active_count() <= spawner::max_concurrent(tuning, st.level, 9));
                if st.is_over() {
                    prop_assert_eq!(st.lives, 0);
                    prop_assert!(!s.spawner_running());
                    // Only cooldown releases may still be pending
                    prop_assert!(s.pending_timers() <= st.busy_cells().count());
                }
                if st.phase == GamePhase::Playing {
                    prop_assert!(s.spawner_running());
                }
                last_level = st.level;
                last_max_combo = st.max_combo;
            }
        }
    }
}
