//! Story Mode
//!
//! Branching dialogue with typed comprehension checks. Progress is saved
//! through a [`ProgressStore`] and cleared once the story ends.

pub mod navigator;
pub mod progress;
pub mod scene;

pub use navigator::{PLAYER_LABEL, StoryNavigator};
pub use progress::{AnswerRecord, DialogueLine, ProgressStore, StorageProgressStore, StoryProgress};
pub use scene::{AnswerKey, Scene, SceneKind, Script};
