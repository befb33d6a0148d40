//! Game state and core simulation types
//!
//! One [`GameState`] per session. It is replaced wholesale on reset so no
//! timer handle from an old session can leak into a new one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::clock::{Millis, Scheduler, TimerId};
use crate::tuning::Tuning;

/// A slot in the grid, `0..cell_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell(pub usize);

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title screen, nothing started yet
    Intro,
    /// Active gameplay
    Playing,
    /// Game is paused; targets frozen, nothing spawns or scores
    Paused,
    /// Lives exhausted; terminal until reset
    GameOver,
}

/// Delayed work queued on the session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Run the spawner
    SpawnTick,
    /// A target's lifetime ran out
    Expire(Cell),
    /// A cell's cooldown is over
    Release(Cell),
}

pub type Timers = Scheduler<Task>;

/// Authoritative state of one play session
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub score: u64,
    /// Derived from score, never decreases
    pub level: u32,
    pub lives: u8,
    /// Consecutive hits since the last miss or wrong hit
    pub combo: u32,
    pub max_combo: u32,
    /// Current target lifetime
    pub speed: Millis,
    /// Live targets and their pending expiry
    active_targets: BTreeMap<Cell, TimerId>,
    /// Cells cooling down after a hit or miss
    busy_cells: BTreeSet<Cell>,
    /// Pending releases for cooling cells
    cooldowns: BTreeMap<Cell, TimerId>,
    pub hits: u32,
    pub misses: u32,
    pub wrong_hits: u32,
}

impl GameState {
    /// Fresh state in the given phase.
    ///
    /// Speed starts at the level-1 lifetime rather than the raw base, so
    /// `speed == tuning.speed_for_level(level)` holds from the first tick.
    pub fn new(tuning: &Tuning, phase: GamePhase) -> Self {
        Self {
            phase,
            score: 0,
            level: 1,
            lives: tuning.starting_lives,
            combo: 0,
            max_combo: 0,
            speed: tuning.speed_for_level(1),
            active_targets: BTreeMap::new(),
            busy_cells: BTreeSet::new(),
            cooldowns: BTreeMap::new(),
            hits: 0,
            misses: 0,
            wrong_hits: 0,
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    /// Whether spawning, expiry and scoring may happen
    pub fn is_live(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_active(&self, cell: Cell) -> bool {
        self.active_targets.contains_key(&cell)
    }

    pub fn is_busy(&self, cell: Cell) -> bool {
        self.busy_cells.contains(&cell)
    }

    pub fn active_count(&self) -> usize {
        self.active_targets.len()
    }

    pub fn active_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.active_targets.keys().copied()
    }

    pub fn busy_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.busy_cells.iter().copied()
    }

    /// Cells neither live nor cooling down, in index order
    pub fn free_cells(&self, cell_count: usize) -> Vec<Cell> {
        (0..cell_count)
            .map(Cell)
            .filter(|c| !self.is_active(*c) && !self.is_busy(*c))
            .collect()
    }

    /// Mark `cell` live with its expiry handle
    pub(crate) fn arm_target(&mut self, cell: Cell, expiry: TimerId) {
        debug_assert!(!self.is_busy(cell), "arming a cooling cell {cell}");
        let previous = self.active_targets.insert(cell, expiry);
        debug_assert!(previous.is_none(), "double-armed cell {cell}");
    }

    /// Take a live target out of play: drop it from the live set, cancel its
    /// expiry and start its cooldown, all in one step. Returns false if the
    /// cell held no live target.
    pub(crate) fn retire_target(&mut self, cell: Cell, timers: &mut Timers) -> bool {
        let Some(expiry) = self.active_targets.remove(&cell) else {
            return false;
        };
        timers.cancel(expiry);
        self.busy_cells.insert(cell);
        true
    }

    /// Track the timer that will release a cooling cell
    pub(crate) fn track_cooldown(&mut self, cell: Cell, release: TimerId) {
        self.cooldowns.insert(cell, release);
    }

    /// End a cell's cooldown. Returns false if it was not cooling.
    pub(crate) fn release_cell(&mut self, cell: Cell) -> bool {
        self.cooldowns.remove(&cell);
        self.busy_cells.remove(&cell)
    }

    /// Cancel every pending expiry but keep the targets logically live
    pub(crate) fn freeze_targets(&mut self, timers: &mut Timers) {
        for expiry in self.active_targets.values() {
            timers.cancel(*expiry);
        }
    }

    /// Drop every live and cooling cell, cancelling their timers
    pub(crate) fn forfeit_cells(&mut self, timers: &mut Timers) {
        for expiry in self.active_targets.values() {
            timers.cancel(*expiry);
        }
        for release in self.cooldowns.values() {
            timers.cancel(*release);
        }
        self.active_targets.clear();
        self.busy_cells.clear();
        self.cooldowns.clear();
    }

    /// Count a successful hit. Returns the points awarded.
    pub(crate) fn register_hit(&mut self, tuning: &Tuning) -> u64 {
        self.hits += 1;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);

        let points = tuning.points_per_combo * self.combo as u64;
        self.score += points;
        self.level = self.level.max(tuning.level_for_score(self.score));
        self.speed = tuning.speed_for_level(self.level);
        points
    }

    pub(crate) fn break_combo(&mut self) {
        self.combo = 0;
    }

    /// Take one life. Returns true once none are left.
    pub(crate) fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }
}
