use crate::atomic::WriteDurability;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Persistence tuning, read from the `store` section of `notecanvas.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Debounce for text notes.
    pub text_debounce_ms: u64,
    /// Debounce for drawing notes, whose payloads are larger.
    pub drawing_debounce_ms: u64,
    pub durability: WriteDurability,
    /// Directory under the vault root holding canvas layout state.
    pub meta_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            text_debounce_ms: 500,
            drawing_debounce_ms: 800,
            durability: WriteDurability::BestEffort,
            meta_dir: ".notecanvas".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.text_debounce_ms)
    }

    pub fn drawing_debounce(&self) -> Duration {
        Duration::from_millis(self.drawing_debounce_ms)
    }
}
