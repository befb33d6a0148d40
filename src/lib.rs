//! Beaver Bash - a whack-a-beaver reaction game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, spawning, hit/miss resolution)
//! - `session`: Start/reset/pause/resume/end orchestration
//! - `levels`: Grid layouts
//! - `tuning`: Data-driven game balance
//! - `audio`: Cue player capability and procedural music
//! - `presentation`: Presenter capability
//! - `records`: Best score/combo persistence
//! - `web`: Browser adapters (wasm32 only)

pub mod audio;
pub mod error;
pub mod levels;
pub mod presentation;
pub mod records;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{InitError, TuningError};
pub use levels::{LevelCatalog, LevelChoice, LevelDefinition};
pub use records::{MemoryRecordStore, RecordStore, Records};
pub use session::{Session, SessionConfig};
pub use settings::Settings;
pub use tuning::{Difficulty, Tuning};
