//! Target spawning
//!
//! One tick places at most one target and reports when the next tick should
//! run. The session owns the loop; this module only decides.

use rand::Rng;

use super::clock::Millis;
use super::events::GameEvent;
use super::state::{Cell, GameState, Task, Timers};
use crate::tuning::Tuning;

/// What the session should do after a spawn tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnStep {
    /// Paused or over: the loop ends until the session restarts it
    Stop,
    /// Nothing placed, try again later
    Retry(Millis),
    /// A target was placed
    Spawned { cell: Cell, next: Millis },
}

impl SpawnStep {
    /// Delay until the next tick, if the loop continues
    pub fn next_delay(&self) -> Option<Millis> {
        match self {
            SpawnStep::Stop => None,
            SpawnStep::Retry(delay) => Some(*delay),
            SpawnStep::Spawned { next, .. } => Some(*next),
        }
    }
}

/// Concurrent target allowance for a level on a grid of `cell_count` cells
pub fn max_concurrent(tuning: &Tuning, level: u32, cell_count: usize) -> usize {
    tuning.max_concurrent(level).min(cell_count.max(1))
}

/// Run one spawner tick
pub fn spawn_tick<R: Rng>(
    state: &mut GameState,
    cell_count: usize,
    timers: &mut Timers,
    rng: &mut R,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> SpawnStep {
    if !state.is_live() {
        return SpawnStep::Stop;
    }

    let allowance = max_concurrent(tuning, state.level, cell_count);
    if state.active_count() >= allowance {
        return SpawnStep::Retry(tuning.saturated_backoff_ms);
    }

    let free = state.free_cells(cell_count);
    if free.is_empty() {
        return SpawnStep::Retry(tuning.no_free_cell_backoff_ms);
    }

    let cell = free[rng.random_range(0..free.len())];
    let expiry = timers.schedule(state.speed, Task::Expire(cell));
    state.arm_target(cell, expiry);
    events.push(GameEvent::CellOccupied(cell));

    let next = tuning.spawn_cadence(state.speed, allowance);
    log::debug!(
        "Spawned target at {} (lifetime {}ms, next tick in {}ms)",
        cell,
        state.speed,
        next
    );
    SpawnStep::Spawned { cell, next }
}
