//! Locally persisted favorite games.

/// Key-value persistence port and its backends.
pub mod storage;
/// The favorites set on top of a key-value slot.
pub mod store;

pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{FavoritesStore, FilterOptions, FAVORITES_KEY};
