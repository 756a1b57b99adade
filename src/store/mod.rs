pub mod favorites;
pub mod kv;

pub use favorites::{FavoriteSet, Favorites, FAVORITES_KEY};
pub use kv::{FileStore, KeyValueStore, MemoryStore, StorageError};
