//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual clock only
//! - Seeded RNG only
//! - Stable iteration order (by cell index)
//! - No rendering, audio or platform dependencies

pub mod clock;
pub mod events;
pub mod resolver;
pub mod spawner;
pub mod state;

pub use clock::{Millis, Scheduler, TimerId};
pub use events::{GameEvent, Outcome};
pub use resolver::{Resolution, hit, miss, release};
pub use spawner::{SpawnStep, max_concurrent, spawn_tick};
pub use state::{Cell, GamePhase, GameState, Task, Timers};
