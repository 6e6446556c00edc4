//! Saved story progress

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::persistence::{self, KeyValueStore};

/// One submitted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub scene_id: u32,
    pub chosen_text: String,
    pub is_correct: bool,
    /// Epoch milliseconds
    pub timestamp: f64,
}

/// One line of the dialogue log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub character: String,
    pub dialogue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryProgress {
    pub story_id: String,
    pub current_scene_id: u32,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    pub dialogue_history: Vec<DialogueLine>,
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl StoryProgress {
    pub fn new(story_id: &str, first_scene: u32, now: f64) -> Self {
        Self {
            story_id: story_id.to_string(),
            current_scene_id: first_scene,
            answers: Vec::new(),
            dialogue_history: Vec::new(),
            start_time: now,
            end_time: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn correct_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

/// Save/load/clear contract for story progress
pub trait ProgressStore {
    fn load_progress(&mut self, story_id: &str) -> Option<StoryProgress>;

    fn save_progress(&mut self, progress: &StoryProgress) -> Result<(), StorageError>;

    fn clear_progress(&mut self, story_id: &str);
}

/// [`ProgressStore`] over any key/value backend, one JSON entry per story
#[derive(Debug, Clone, Default)]
pub struct StorageProgressStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StorageProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn key(story_id: &str) -> String {
        format!("storyProgress_{}", story_id)
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

impl<S: KeyValueStore> ProgressStore for StorageProgressStore<S> {
    /// Mismatched or unreadable entries are removed
    fn load_progress(&mut self, story_id: &str) -> Option<StoryProgress> {
        let key = Self::key(story_id);
        self.store.get(&key)?;

        match persistence::load_json::<StoryProgress>(&self.store, &key) {
            Some(progress) if progress.story_id == story_id => {
                log::info!("Loaded progress for story '{}'", story_id);
                Some(progress)
            }
            Some(_) => {
                log::warn!("Saved progress under '{}' belongs to another story, discarding", key);
                self.store.remove(&key);
                None
            }
            None => {
                log::error!("Failed to read saved progress for story '{}', discarding", story_id);
                self.store.remove(&key);
                None
            }
        }
    }

    fn save_progress(&mut self, progress: &StoryProgress) -> Result<(), StorageError> {
        persistence::save_json(&mut self.store, &Self::key(&progress.story_id), progress)
    }

    fn clear_progress(&mut self, story_id: &str) {
        self.store.remove(&Self::key(story_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_save_load_clear() {
        let mut store = StorageProgressStore::new(MemoryStore::new());
        let mut progress = StoryProgress::new("c1", 0, 1000.0);
        progress.dialogue_history.push(DialogueLine {
            character: "Elara".into(),
            dialogue: "Hello".into(),
        });
        store.save_progress(&progress).unwrap();
        assert!(store.inner().get("storyProgress_c1").is_some());
        assert_eq!(store.load_progress("c1"), Some(progress));

        store.clear_progress("c1");
        assert_eq!(store.load_progress("c1"), None);
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let mut store = StorageProgressStore::new(MemoryStore::new());
        store
            .save_progress(&StoryProgress::new("c1", 4, 0.0))
            .unwrap();
        let raw = store.inner().get("storyProgress_c1").unwrap();
        assert!(raw.contains("\"currentSceneId\":4"));
        assert!(raw.contains("\"endTime\":null"));
    }

    #[test]
    fn test_mismatched_and_corrupt_entries_are_removed() {
        let mut backend = MemoryStore::new();
        let other = serde_json::to_string(&StoryProgress::new("other", 0, 0.0)).unwrap();
        backend.set("storyProgress_c1", &other).unwrap();
        backend.set("storyProgress_c2", "{not json").unwrap();
        let mut store = StorageProgressStore::new(backend);

        assert_eq!(store.load_progress("c1"), None);
        assert_eq!(store.load_progress("c2"), None);
        assert!(store.inner().is_empty());
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut store = StorageProgressStore::new(MemoryStore::read_only());
        assert!(matches!(
            store.save_progress(&StoryProgress::new("c1", 0, 0.0)),
            Err(StorageError::Write(_))
        ));
    }
}
