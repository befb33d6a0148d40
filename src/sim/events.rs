//! Semantic events emitted by the simulation
//!
//! The core never touches the screen or the speakers. It queues events and
//! the session hands them to the presenter and cue player adapters.

use super::state::Cell;
use crate::audio::{CuePlayer, Tone};
use crate::levels::LevelDefinition;
use crate::presentation::Presenter;

/// How a target left play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // === Presentation ===
    /// Lay out the grid for a level
    ShowLevel(LevelDefinition),
    /// Clear every cell and the combo display
    ResetBoard,
    IntroDismissed,
    IntroStats { high_score: u64, max_combo: u32 },
    CellOccupied(Cell),
    CellResolved { cell: Cell, outcome: Outcome },
    CellCleared(Cell),
    Scoreboard { score: u64, level: u32, lives: u8 },
    Combo(u32),
    WrongHitAlert,
    Paused(bool),
    GameOver { score: u64, max_combo: u32 },

    // === Audio ===
    Tone(Tone),
    AmbientStart,
    AmbientStop,
    AmbientTempo(f32),
    EndPhrase,
}

impl GameEvent {
    /// Whether this event belongs to the cue player
    pub fn is_cue(&self) -> bool {
        matches!(
            self,
            GameEvent::Tone(_)
                | GameEvent::AmbientStart
                | GameEvent::AmbientStop
                | GameEvent::AmbientTempo(_)
                | GameEvent::EndPhrase
        )
    }

    /// Route the event to its adapter
    pub fn deliver<P: Presenter + ?Sized, C: CuePlayer + ?Sized>(
        &self,
        presenter: &mut P,
        cues: &mut C,
    ) {
        match self {
            GameEvent::ShowLevel(level) => presenter.show_level(level),
            GameEvent::ResetBoard => presenter.reset_board(),
            GameEvent::IntroDismissed => presenter.hide_intro(),
            GameEvent::IntroStats {
                high_score,
                max_combo,
            } => presenter.show_intro_stats(*high_score, *max_combo),
            GameEvent::CellOccupied(cell) => presenter.mark_cell_occupied(*cell),
            GameEvent::CellResolved { cell, outcome } => {
                presenter.mark_cell_resolved(*cell, *outcome)
            }
            GameEvent::CellCleared(cell) => presenter.clear_cell(*cell),
            GameEvent::Scoreboard {
                score,
                level,
                lives,
            } => presenter.update_scoreboard(*score, *level, *lives),
            GameEvent::Combo(value) => presenter.show_combo(*value),
            GameEvent::WrongHitAlert => presenter.show_wrong_hit_alert(),
            GameEvent::Paused(paused) => presenter.show_paused(*paused),
            GameEvent::GameOver { score, max_combo } => {
                presenter.show_game_over(*score, *max_combo)
            }

            GameEvent::Tone(tone) => cues.play_tone(*tone),
            GameEvent::AmbientStart => cues.start_ambient(),
            GameEvent::AmbientStop => cues.stop_ambient(),
            GameEvent::AmbientTempo(tempo) => cues.set_ambient_tempo(*tempo),
            GameEvent::EndPhrase => cues.play_end_phrase(),
        }
    }
}
