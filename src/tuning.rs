//! Data-driven game balance
//!
//! Every timing and scoring constant lives in [`Tuning`] so difficulty
//! presets and hand-edited JSON can change pacing without touching the
//! simulation.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::Millis;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Relaxed,
    #[default]
    FairPlay,
    Frantic,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Relaxed => "Relaxed",
            Difficulty::FairPlay => "Fair Play",
            Difficulty::Frantic => "Frantic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(Difficulty::Relaxed),
            "fair play" | "fairplay" | "fair" | "normal" => Some(Difficulty::FairPlay),
            "frantic" | "hard" => Some(Difficulty::Frantic),
            _ => None,
        }
    }

    /// Balance values for this preset
    pub fn tuning(&self) -> Tuning {
        let base = Tuning::default();
        match self {
            Difficulty::Relaxed => Tuning {
                base_speed_ms: 1500,
                min_speed_ms: 900,
                speed_decrease_per_level_ms: 8,
                levels_per_extra_target: 15,
                ..base
            },
            Difficulty::FairPlay => base,
            Difficulty::Frantic => Tuning {
                base_speed_ms: 1000,
                min_speed_ms: 500,
                speed_decrease_per_level_ms: 15,
                levels_per_extra_target: 5,
                max_concurrent_cap: 4,
                spawn_floor_ms: 300,
                ..base
            },
        }
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Target lifetime ===
    /// Lifetime before any level scaling
    pub base_speed_ms: Millis,
    /// Lifetime never drops below this
    pub min_speed_ms: Millis,
    /// Lifetime lost per level
    pub speed_decrease_per_level_ms: Millis,

    // === Scoring ===
    pub starting_lives: u8,
    /// Points per hit are this times the current combo
    pub points_per_combo: u64,
    /// Score needed per level step
    pub score_per_level: u64,

    // === Scheduling ===
    /// Lockout after a hit or miss before the cell can host a new target
    pub cooldown_ms: Millis,
    /// Delay between reset and the first spawn tick
    pub first_spawn_delay_ms: Millis,
    /// Retry delay when the concurrency cap is reached
    pub saturated_backoff_ms: Millis,
    /// Retry delay when every cell is live or cooling down
    pub no_free_cell_backoff_ms: Millis,
    /// Spawn cadence never drops below this
    pub spawn_floor_ms: Millis,
    /// Divides the lifetime when computing spawn cadence
    pub density_factor: f64,
    /// One extra concurrent target every this many levels
    pub levels_per_extra_target: u32,
    pub max_concurrent_cap: usize,

    // === Audio ===
    /// Ambient tempo gained per level
    pub tempo_per_level: f32,
    pub success_base_hz: f32,
    /// Success cue pitch gained per combo step
    pub success_hz_per_combo: f32,
    pub wrong_hit_hz: f32,
    pub miss_hz: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed_ms: 1200,
            min_speed_ms: 650,
            speed_decrease_per_level_ms: 10,

            starting_lives: 3,
            points_per_combo: 10,
            score_per_level: 100,

            cooldown_ms: 300,
            first_spawn_delay_ms: 500,
            saturated_backoff_ms: 500,
            no_free_cell_backoff_ms: 300,
            spawn_floor_ms: 400,
            density_factor: 0.8,
            levels_per_extra_target: 10,
            max_concurrent_cap: 3,

            tempo_per_level: 0.1,
            success_base_hz: 600.0,
            success_hz_per_combo: 50.0,
            wrong_hit_hz: 150.0,
            miss_hz: 200.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning file. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would stall or flood the scheduler
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: &str| Err(TuningError::Invalid(msg.to_string()));

        if self.min_speed_ms == 0 {
            return invalid("min_speed_ms must be positive");
        }
        if self.min_speed_ms > self.base_speed_ms {
            return invalid("min_speed_ms exceeds base_speed_ms");
        }
        if self.starting_lives == 0 {
            return invalid("starting_lives must be at least 1");
        }
        if self.score_per_level == 0 {
            return invalid("score_per_level must be positive");
        }
        if self.spawn_floor_ms == 0
            || self.saturated_backoff_ms == 0
            || self.no_free_cell_backoff_ms == 0
        {
            return invalid("spawn floor and backoffs must be positive");
        }
        if !(self.density_factor > 0.0) {
            return invalid("density_factor must be positive");
        }
        if self.levels_per_extra_target == 0 {
            return invalid("levels_per_extra_target must be positive");
        }
        if self.max_concurrent_cap == 0 {
            return invalid("max_concurrent_cap must be at least 1");
        }
        Ok(())
    }

    /// Level for a score: one step per `score_per_level` points, starting at 1
    pub fn level_for_score(&self, score: u64) -> u32 {
        let steps = score / self.score_per_level;
        u32::try_from(steps).unwrap_or(u32::MAX - 1) + 1
    }

    /// Target lifetime at a level, clamped to the floor
    pub fn speed_for_level(&self, level: u32) -> Millis {
        let decrease = self.speed_decrease_per_level_ms.saturating_mul(level as Millis);
        self.base_speed_ms
            .saturating_sub(decrease)
            .max(self.min_speed_ms)
    }

    /// Concurrent target allowance: non-decreasing in level, bounded by the cap
    pub fn max_concurrent(&self, level: u32) -> usize {
        let steps = level.saturating_sub(1) / self.levels_per_extra_target;
        (steps as usize + 1).min(self.max_concurrent_cap)
    }

    /// Delay until the next spawn attempt after placing a target
    pub fn spawn_cadence(&self, speed: Millis, max_concurrent: usize) -> Millis {
        let spread = speed as f64 / (max_concurrent as f64 * self.density_factor);
        (spread.floor() as Millis).max(self.spawn_floor_ms)
    }

    /// Ambient tempo multiplier at a level
    pub fn ambient_tempo(&self, level: u32) -> f32 {
        1.0 + level as f32 * self.tempo_per_level
    }

    /// Success cue pitch for a combo
    pub fn success_pitch(&self, combo: u32) -> f32 {
        self.success_base_hz + combo as f32 * self.success_hz_per_combo
    }
}
