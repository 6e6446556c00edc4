//! Player preferences
//!
//! Persisted separately from story progress through a [`KeyValueStore`].

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::persistence::{self, KeyValueStore};
use crate::sim::Difficulty;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Difficulty offered first in menus
    pub preferred_difficulty: Difficulty,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.5,
            preferred_difficulty: Difficulty::Beginner,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "monster_typer_settings";

    /// Load settings, falling back to defaults
    pub fn load(store: &impl KeyValueStore) -> Self {
        match persistence::load_json::<Settings>(store, Self::STORAGE_KEY) {
            Some(mut settings) => {
                settings.master_volume = settings.master_volume.clamp(0.0, 1.0);
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StorageError> {
        persistence::save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }

    pub fn update_volume(&mut self, level: f32) {
        self.master_volume = level.clamp(0.0, 1.0);
    }

    /// Accepts tier names like "beginner" or "hard"; unknown names are ignored
    pub fn update_difficulty(&mut self, name: &str) -> bool {
        match Difficulty::from_str(name) {
            Some(d) => {
                self.preferred_difficulty = d;
                true
            }
            None => {
                log::warn!("Unknown difficulty '{}'", name);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_when_nothing_saved() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.update_volume(0.8);
        assert!(settings.update_difficulty("Hard"));
        settings.save(&mut store).unwrap();
        let loaded = Settings::load(&store);
        assert_eq!(loaded.preferred_difficulty, Difficulty::Hard);
        assert!((loaded.master_volume - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_volume_is_clamped_and_bad_difficulty_ignored() {
        let mut store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{"master_volume": 4.0}"#)
            .unwrap();
        let mut settings = Settings::load(&store);
        assert_eq!(settings.master_volume, 1.0);
        settings.update_volume(-1.0);
        assert_eq!(settings.master_volume, 0.0);
        assert!(!settings.update_difficulty("expert"));
        assert_eq!(settings.preferred_difficulty, Difficulty::Beginner);
    }

    #[test]
    fn test_failed_save_is_reported() {
        let mut store = MemoryStore::read_only();
        assert!(Settings::default().save(&mut store).is_err());
    }
}
