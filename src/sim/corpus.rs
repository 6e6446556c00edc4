//! Question corpus document
//!
//! Shape: `{"topics": {theme: {"beginner": [{description, answer}], ...}}}`.
//! A bare `{theme: {...}}` map is accepted too.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::question::{Difficulty, Question};
use crate::error::CorpusError;

#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    description: String,
    answer: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawTheme {
    #[serde(default)]
    beginner: Vec<Value>,
    #[serde(default)]
    medium: Vec<Value>,
    #[serde(default)]
    hard: Vec<Value>,
}

/// All questions of one theme, by tier
#[derive(Debug, Clone, Default)]
pub struct ThemeQuestions {
    tiers: [Vec<Question>; 3],
}

impl ThemeQuestions {
    pub fn tier(&self, difficulty: Difficulty) -> &[Question] {
        &self.tiers[difficulty.index()]
    }

    pub fn push(&mut self, question: Question) {
        self.tiers[question.difficulty.index()].push(question);
    }
}

/// Read-only content keyed by theme name
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    themes: HashMap<String, ThemeQuestions>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a corpus document. Themes and entries that do not have the
    /// expected shape are skipped with a warning.
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let mut root: Map<String, Value> = serde_json::from_str(json)?;
        let topics = match root.remove("topics") {
            Some(topics) => serde_json::from_value::<Map<String, Value>>(topics)?,
            None => root,
        };
        if topics.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut corpus = Corpus::new();
        let mut skipped = 0;
        for (theme, value) in topics {
            let raw = match serde_json::from_value::<RawTheme>(value) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Skipping malformed theme '{}': {}", theme, e);
                    continue;
                }
            };
            let tiers = [
                (Difficulty::Beginner, raw.beginner),
                (Difficulty::Medium, raw.medium),
                (Difficulty::Hard, raw.hard),
            ];
            let mut questions = ThemeQuestions::default();
            for (difficulty, entries) in tiers {
                for entry in entries {
                    match serde_json::from_value::<RawEntry>(entry) {
                        Ok(e) => questions.push(Question::new(
                            e.id,
                            e.kind.as_deref(),
                            e.description,
                            e.answer,
                            difficulty,
                        )),
                        Err(e) => {
                            log::warn!(
                                "Skipping {} entry in '{}': {}",
                                difficulty.as_str(),
                                theme,
                                e
                            );
                            skipped += 1;
                        }
                    }
                }
            }
            corpus.themes.insert(theme, questions);
        }
        if skipped > 0 {
            log::warn!("Skipped {} malformed corpus entries", skipped);
        }
        if corpus.themes.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(corpus)
    }

    /// Add a single question (used to build corpora in code)
    pub fn insert(&mut self, theme: &str, question: Question) {
        self.themes
            .entry(theme.to_string())
            .or_default()
            .push(question);
    }

    pub fn theme(&self, theme: &str) -> Option<&ThemeQuestions> {
        self.themes.get(theme)
    }

    pub fn theme_count(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}
