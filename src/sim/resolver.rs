//! Hit, miss and cooldown resolution
//!
//! Every entry point is a silent no-op unless the session is playing.
//! A target resolves at most once: [`GameState::retire_target`] removes it
//! from the live set and cancels its expiry in the same step, so whichever
//! of `hit` or `miss` gets there first wins and the other finds nothing.

use super::events::{GameEvent, Outcome};
use super::state::{Cell, GameState, Task, Timers};
use crate::audio::{Tone, Waveform};
use crate::tuning::Tuning;

/// Result of a resolver entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Guarded out: not playing, or nothing to resolve
    Ignored,
    Hit { cell: Cell, points: u64, combo: u32 },
    WrongHit { cell: Cell, lives_left: u8 },
    Missed { cell: Cell, lives_left: u8 },
}

impl Resolution {
    /// Whether the session must end now
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Resolution::WrongHit { lives_left: 0, .. } | Resolution::Missed { lives_left: 0, .. }
        )
    }
}

/// Player struck `cell`
pub fn hit(
    state: &mut GameState,
    cell: Cell,
    timers: &mut Timers,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> Resolution {
    if !state.is_live() {
        return Resolution::Ignored;
    }

    if !state.retire_target(cell, timers) {
        return wrong_hit(state, cell, tuning, events);
    }

    events.push(GameEvent::CellResolved {
        cell,
        outcome: Outcome::Hit,
    });

    let points = state.register_hit(tuning);
    events.push(GameEvent::Combo(state.combo));
    events.push(GameEvent::AmbientTempo(tuning.ambient_tempo(state.level)));
    events.push(GameEvent::Tone(Tone::new(
        tuning.success_pitch(state.combo),
        Waveform::Square,
    )));
    push_scoreboard(state, events);

    let release = timers.schedule(tuning.cooldown_ms, Task::Release(cell));
    state.track_cooldown(cell, release);

    log::debug!(
        "Hit {} for {} points (combo {}, score {})",
        cell,
        points,
        state.combo,
        state.score
    );
    Resolution::Hit {
        cell,
        points,
        combo: state.combo,
    }
}

/// Player struck a cell with no live target
fn wrong_hit(
    state: &mut GameState,
    cell: Cell,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> Resolution {
    state.wrong_hits += 1;
    state.lose_life();
    state.break_combo();

    events.push(GameEvent::Combo(0));
    events.push(GameEvent::Tone(Tone::new(tuning.wrong_hit_hz, Waveform::Sawtooth)));
    events.push(GameEvent::WrongHitAlert);
    push_scoreboard(state, events);

    log::debug!("Wrong hit on {} ({} lives left)", cell, state.lives);
    Resolution::WrongHit {
        cell,
        lives_left: state.lives,
    }
}

/// A target's lifetime ran out
pub fn miss(
    state: &mut GameState,
    cell: Cell,
    timers: &mut Timers,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> Resolution {
    if !state.is_live() {
        return Resolution::Ignored;
    }
    if !state.retire_target(cell, timers) {
        return Resolution::Ignored;
    }

    state.misses += 1;
    state.break_combo();
    let exhausted = state.lose_life();

    events.push(GameEvent::CellResolved {
        cell,
        outcome: Outcome::Miss,
    });
    events.push(GameEvent::Combo(0));
    events.push(GameEvent::Tone(Tone::new(tuning.miss_hz, Waveform::Sawtooth)));
    push_scoreboard(state, events);

    if !exhausted {
        let release = timers.schedule(tuning.cooldown_ms, Task::Release(cell));
        state.track_cooldown(cell, release);
    }

    log::debug!("Missed {} ({} lives left)", cell, state.lives);
    Resolution::Missed {
        cell,
        lives_left: state.lives,
    }
}

/// A cell's cooldown finished; make it spawnable again
pub fn release(state: &mut GameState, cell: Cell, events: &mut Vec<GameEvent>) -> bool {
    if !state.release_cell(cell) {
        return false;
    }
    events.push(GameEvent::CellCleared(cell));
    true
}

fn push_scoreboard(state: &GameState, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Scoreboard {
        score: state.score,
        level: state.level,
        lives: state.lives,
    });
}
