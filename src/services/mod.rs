// Core services
// Scoring, per-item classification caching and settings persistence.

pub mod cache;
pub mod scorer;
pub mod settings_store;

pub use cache::{CacheEvent, ClassificationCache, ItemId};
pub use scorer::*;
pub use settings_store::{SettingsStore, StoreError};
