//! Persisted list of favorite city names.
//!
//! The store is read and rewritten as a whole; it does not deduplicate. [`add`] and
//! [`remove`] are the callers that keep the list tidy.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{fs, path::PathBuf};

use crate::Config;

pub trait FavoritesStore: Send + Sync {
    fn load(&self) -> Result<Vec<String>>;
    fn save(&self, favorites: &[String]) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryFavorites {
    items: Mutex<Vec<String>>,
}

impl FavoritesStore for MemoryFavorites {
    fn load(&self) -> Result<Vec<String>> {
        Ok(self.items.lock().clone())
    }

    fn save(&self, favorites: &[String]) -> Result<()> {
        *self.items.lock() = favorites.to_vec();
        Ok(())
    }
}

/// JSON array of strings on disk.
#[derive(Debug, Clone)]
pub struct FileFavorites {
    path: PathBuf,
}

impl FileFavorites {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the platform data directory.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(Config::favorites_file_path()?))
    }
}

impl FavoritesStore for FileFavorites {
    fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read favorites: {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse favorites: {}", self.path.display()))
    }

    fn save(&self, favorites: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favorites directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(favorites).context("Failed to serialize favorites")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write favorites: {}", self.path.display()))
    }
}

/// Append `name` unless already present. Returns the resulting list.
pub fn add(store: &dyn FavoritesStore, name: &str) -> Result<Vec<String>> {
    let name = name.trim();
    let mut favorites = store.load()?;

    if !name.is_empty() && !favorites.iter().any(|f| f == name) {
        favorites.push(name.to_string());
        store.save(&favorites)?;
    }

    Ok(favorites)
}

/// Drop every entry equal to `name`. Returns the resulting list.
pub fn remove(store: &dyn FavoritesStore, name: &str) -> Result<Vec<String>> {
    let name = name.trim();
    let mut favorites = store.load()?;
    let before = favorites.len();

    favorites.retain(|f| f != name);
    if favorites.len() != before {
        store.save(&favorites)?;
    }

    Ok(favorites)
}
