//! Personal records
//!
//! Best score and best combo, kept in a key/value store that survives
//! sessions. Both only ever go up, and only at session end.

use std::collections::HashMap;

/// Integer key/value persistence
pub trait RecordStore {
    /// Stored value, or 0 when absent or unreadable
    fn get(&self, key: &str) -> u64;
    fn set(&mut self, key: &str, value: u64);
}

/// Best results across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Records {
    pub high_score: u64,
    pub max_combo: u32,
}

/// Which records a finished session beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordUpdate {
    pub new_high_score: bool,
    pub new_max_combo: bool,
}

impl RecordUpdate {
    pub fn any(&self) -> bool {
        self.new_high_score || self.new_max_combo
    }
}

impl Records {
    /// Storage keys
    pub const HIGH_SCORE_KEY: &'static str = "beaver_highScore";
    pub const MAX_COMBO_KEY: &'static str = "beaver_maxCombo";

    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Self {
        Self {
            high_score: store.get(Self::HIGH_SCORE_KEY),
            max_combo: u32::try_from(store.get(Self::MAX_COMBO_KEY)).unwrap_or(u32::MAX),
        }
    }

    /// Fold a finished session into the records, writing only values that
    /// were beaten.
    pub fn submit<S: RecordStore + ?Sized>(
        &mut self,
        score: u64,
        max_combo: u32,
        store: &mut S,
    ) -> RecordUpdate {
        let mut update = RecordUpdate::default();

        if score > self.high_score {
            self.high_score = score;
            store.set(Self::HIGH_SCORE_KEY, score);
            update.new_high_score = true;
            log::info!("New high score: {}", score);
        }
        if max_combo > self.max_combo {
            self.max_combo = max_combo;
            store.set(Self::MAX_COMBO_KEY, max_combo as u64);
            update.new_max_combo = true;
            log::info!("New best combo: {}", max_combo);
        }

        update
    }
}

/// In-memory store for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    values: HashMap<String, u64>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, key: &str) -> u64 {
        self.values.get(key).copied().unwrap_or(0)
    }

    fn set(&mut self, key: &str, value: u64) {
        self.values.insert(key.to_string(), value);
    }
}

/// Browser LocalStorage store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalRecordStore;

#[cfg(target_arch = "wasm32")]
impl LocalRecordStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl RecordStore for LocalRecordStore {
    fn get(&self, key: &str) -> u64 {
        let Some(raw) = Self::storage().and_then(|s| s.get_item(key).ok().flatten()) else {
            return 0;
        };
        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Unreadable record '{}' = {:?}, treating as 0", key, raw);
                0
            }
        }
    }

    fn set(&mut self, key: &str, value: u64) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(key, &value.to_string());
        }
    }
}
