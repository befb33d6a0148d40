//! Level catalog
//!
//! Static grid layouts. One is picked at session start and stays fixed until
//! the next reset.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{InitError, Result};

/// An immutable grid layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDefinition {
    pub name: &'static str,
    pub rows: usize,
    pub cols: usize,
    /// CSS `background` value for the board
    pub background: &'static str,
}

impl LevelDefinition {
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Which level to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LevelChoice {
    /// Pick uniformly from the catalog at every reset
    #[default]
    Random,
    /// Always play the named level
    Named(String),
}

const BUILTIN: [LevelDefinition; 4] = [
    LevelDefinition {
        name: "Meadow",
        rows: 3,
        cols: 3,
        background: "linear-gradient(#9ccc65, #558b2f)",
    },
    LevelDefinition {
        name: "Riverbank",
        rows: 3,
        cols: 4,
        background: "linear-gradient(#81d4fa, #6d8b3a 60%)",
    },
    LevelDefinition {
        name: "Birch Grove",
        rows: 4,
        cols: 3,
        background: "repeating-linear-gradient(90deg, #f5f5f0 0 14px, #3e3e3e 14px 18px, #aed581 18px 60px)",
    },
    LevelDefinition {
        name: "Beaver Dam",
        rows: 4,
        cols: 4,
        background: "linear-gradient(#4fc3f7, #5d4037 55%)",
    },
];

/// The built-in levels
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<LevelDefinition>,
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelCatalog {
    pub fn builtin() -> Self {
        Self {
            levels: BUILTIN.to_vec(),
        }
    }

    /// Case-insensitive lookup
    pub fn by_name(&self, name: &str) -> Option<&LevelDefinition> {
        self.levels
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a choice to a concrete level
    pub fn choose<R: Rng>(&self, choice: &LevelChoice, rng: &mut R) -> Result<LevelDefinition> {
        match choice {
            LevelChoice::Random => {
                let idx = rng.random_range(0..self.levels.len());
                Ok(self.levels[idx].clone())
            }
            LevelChoice::Named(name) => self
                .by_name(name)
                .cloned()
                .ok_or_else(|| InitError::UnknownLevel(name.clone())),
        }
    }
}
