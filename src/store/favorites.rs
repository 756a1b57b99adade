use super::kv::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};

pub const FAVORITES_KEY: &str = "favorites";

/// On-disk shape: `{"state": [url, ...]}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesRecord {
    #[serde(default)]
    state: Vec<String>,
}

/// Favorited image URLs in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    members: Vec<String>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let record: FavoritesRecord = serde_json::from_str(json)?;
        let mut set = Self::new();
        for url in record.state {
            set.insert(url);
        }
        Ok(set)
    }

    pub fn to_json(&self) -> String {
        let record = FavoritesRecord {
            state: self.members.clone(),
        };
        // A struct holding a Vec<String> always serializes.
        serde_json::to_string(&record).unwrap_or_else(|_| r#"{"state":[]}"#.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.iter().any(|m| m == url)
    }

    /// Returns false if `url` was already present.
    pub fn insert(&mut self, url: String) -> bool {
        if self.contains(&url) {
            return false;
        }
        self.members.push(url);
        true
    }

    /// Returns false if `url` was not present.
    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != url);
        self.members.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A [`FavoriteSet`] bound to the store it was loaded from. Every change
/// rewrites the whole record.
pub struct Favorites {
    set: FavoriteSet,
    store: Box<dyn KeyValueStore>,
}

impl Favorites {
    /// Never fails: unreadable or malformed data starts an empty set.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let set = match store.get(FAVORITES_KEY) {
            Ok(Some(json)) => FavoriteSet::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed favorites record: {}", e);
                FavoriteSet::new()
            }),
            Ok(None) => FavoriteSet::new(),
            Err(e) => {
                log::warn!("Could not read favorites: {}", e);
                FavoriteSet::new()
            }
        };
        log::info!("Loaded {} favorites", set.len());
        Self { set, store }
    }

    pub fn set(&self) -> &FavoriteSet {
        &self.set
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.set.contains(url)
    }

    /// Returns whether the set changed.
    pub fn save(&mut self, url: &str) -> Result<bool, StorageError> {
        let mut next = self.set.clone();
        if !next.insert(url.to_string()) {
            return Ok(false);
        }
        self.commit(next)?;
        Ok(true)
    }

    /// Returns whether the set changed.
    pub fn remove(&mut self, url: &str) -> Result<bool, StorageError> {
        let mut next = self.set.clone();
        if !next.remove(url) {
            return Ok(false);
        }
        self.commit(next)?;
        Ok(true)
    }

    /// Returns whether `url` is a favorite afterwards.
    pub fn toggle(&mut self, url: &str) -> Result<bool, StorageError> {
        if self.contains(url) {
            self.remove(url)?;
            Ok(false)
        } else {
            self.save(url)?;
            Ok(true)
        }
    }

    /// The in-memory set only changes once the store has the new record.
    fn commit(&mut self, next: FavoriteSet) -> Result<(), StorageError> {
        self.store.set(FAVORITES_KEY, &next.to_json())?;
        self.set = next;
        log::info!("Persisted {} favorites", self.set.len());
        Ok(())
    }
}
