//! Story scripts
//!
//! A script is an ordered list of scenes. Without an explicit target, a scene
//! advances to the next entry in the list. Question scenes branch on the typed
//! answer; ending scenes close the story.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ScriptError;

/// Expected answer of a question scene and where each outcome leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub text: String,
    pub correct_next: Option<u32>,
    pub incorrect_next: Option<u32>,
}

impl AnswerKey {
    /// Trimmed, case-insensitive comparison
    pub fn matches(&self, input: &str) -> bool {
        self.text.trim().to_lowercase() == input.trim().to_lowercase()
    }

    pub fn next_for(&self, correct: bool) -> Option<u32> {
        if correct {
            self.correct_next
        } else {
            self.incorrect_next
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneKind {
    Dialogue,
    Question { answer: AnswerKey },
    CorrectEnding,
    WrongEnding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub id: u32,
    pub character: String,
    pub dialogue: String,
    pub kind: SceneKind,
}

impl Scene {
    pub fn answer_key(&self) -> Option<&AnswerKey> {
        match &self.kind {
            SceneKind::Question { answer } => Some(answer),
            _ => None,
        }
    }

    pub fn is_question(&self) -> bool {
        matches!(self.kind, SceneKind::Question { .. })
    }

    pub fn is_ending(&self) -> bool {
        matches!(self.kind, SceneKind::CorrectEnding | SceneKind::WrongEnding)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnswer {
    text: String,
    #[serde(default)]
    correct_index: Option<u32>,
    #[serde(default)]
    incorrect_index: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    character: String,
    #[serde(default)]
    dialogue: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    answer: Option<RawAnswer>,
}

impl RawScene {
    fn into_scene(self, position: usize) -> Scene {
        let id = self.id.unwrap_or(position as u32);
        let kind = match (self.kind.as_deref(), self.answer) {
            (Some("question"), Some(answer)) => SceneKind::Question {
                answer: AnswerKey {
                    text: answer.text,
                    correct_next: answer.correct_index,
                    incorrect_next: answer.incorrect_index,
                },
            },
            (Some("question"), None) => {
                log::warn!("Question scene {} has no answer, treating as dialogue", id);
                SceneKind::Dialogue
            }
            (Some("correctED"), _) => SceneKind::CorrectEnding,
            (Some("wrongED"), _) => SceneKind::WrongEnding,
            _ => SceneKind::Dialogue,
        };
        Scene {
            id,
            character: self.character,
            dialogue: self.dialogue,
            kind,
        }
    }
}

/// Ordered, id-addressable scenes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    scenes: Vec<Scene>,
}

impl Script {
    pub fn new(scenes: Vec<Scene>) -> Result<Self, ScriptError> {
        if scenes.is_empty() {
            return Err(ScriptError::Empty);
        }
        let mut seen = HashSet::new();
        for scene in &scenes {
            if !seen.insert(scene.id) {
                return Err(ScriptError::DuplicateScene(scene.id));
            }
        }
        Ok(Self { scenes })
    }

    /// Parse a JSON array of scenes. Scenes without an id take their position.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let raw: Vec<RawScene> = serde_json::from_str(json)?;
        let scenes = raw
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_scene(i))
            .collect();
        Self::new(scenes)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn first(&self) -> &Scene {
        &self.scenes[0]
    }

    pub fn position(&self, id: u32) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    pub fn get(&self, id: u32) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// The scene listed after `id`, if any
    pub fn following(&self, id: u32) -> Option<&Scene> {
        self.scenes.get(self.position(id)? + 1)
    }
}
