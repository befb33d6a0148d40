//! Presentation capability
//!
//! The game core decides *what* happened; a [`Presenter`] decides how it
//! looks. The browser build drives the DOM, headless runs log.

use crate::levels::LevelDefinition;
use crate::sim::{Cell, Outcome};

/// Visual output used by the game core
pub trait Presenter {
    /// Lay out the grid for a level (cell count, background)
    fn show_level(&mut self, level: &LevelDefinition);
    /// Clear every cell and the combo display
    fn reset_board(&mut self);
    fn hide_intro(&mut self);
    fn show_intro_stats(&mut self, high_score: u64, max_combo: u32);

    fn mark_cell_occupied(&mut self, cell: Cell);
    fn mark_cell_resolved(&mut self, cell: Cell, outcome: Outcome);
    fn clear_cell(&mut self, cell: Cell);

    fn update_scoreboard(&mut self, score: u64, level: u32, lives: u8);
    /// Current combo; 0 clears the display
    fn show_combo(&mut self, value: u32);
    fn show_wrong_hit_alert(&mut self);
    fn show_paused(&mut self, paused: bool);
    fn show_game_over(&mut self, final_score: u64, final_max_combo: u32);
}

/// Combo values worth showing (a single hit is not a combo)
pub fn combo_label(value: u32) -> Option<String> {
    (value >= 2).then(|| format!("x{}", value))
}

/// Presenter for headless runs: logs milestones, ignores per-cell noise
#[derive(Debug, Default)]
pub struct LogPresenter {
    last_level: u32,
}

impl Presenter for LogPresenter {
    fn show_level(&mut self, level: &LevelDefinition) {
        log::info!(
            "Level '{}' ({}x{}, {} cells)",
            level.name,
            level.rows,
            level.cols,
            level.cell_count()
        );
    }

    fn reset_board(&mut self) {
        self.last_level = 1;
    }

    fn hide_intro(&mut self) {}

    fn show_intro_stats(&mut self, high_score: u64, max_combo: u32) {
        log::info!("Best score {} / best combo {}", high_score, max_combo);
    }

    fn mark_cell_occupied(&mut self, cell: Cell) {
        log::trace!("beaver up at {}", cell);
    }

    fn mark_cell_resolved(&mut self, cell: Cell, outcome: Outcome) {
        log::trace!("{} resolved: {:?}", cell, outcome);
    }

    fn clear_cell(&mut self, _cell: Cell) {}

    fn update_scoreboard(&mut self, score: u64, level: u32, lives: u8) {
        if level > self.last_level {
            log::info!("Level {} reached (score {}, lives {})", level, score, lives);
            self.last_level = level;
        }
    }

    fn show_combo(&mut self, value: u32) {
        if let Some(label) = combo_label(value) {
            log::debug!("combo {}", label);
        }
    }

    fn show_wrong_hit_alert(&mut self) {
        log::debug!("wrong hole!");
    }

    fn show_paused(&mut self, paused: bool) {
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    fn show_game_over(&mut self, final_score: u64, final_max_combo: u32) {
        log::info!(
            "Game over - score {}, best combo {}",
            final_score,
            final_max_combo
        );
    }
}
