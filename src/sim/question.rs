//! Questions, difficulty tiers and per-theme samples

use serde::{Deserialize, Serialize};

/// Difficulty tier of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Medium,
    Hard,
}

impl Difficulty {
    /// All tiers, easiest first (also the fallback scan order)
    pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Some(Difficulty::Beginner),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Next harder tier (saturates at Hard)
    pub fn harder(&self) -> Self {
        match self {
            Difficulty::Beginner => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }
}

/// A single prompt/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub description: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

impl Question {
    /// Build a question, deriving a stable id when none is given
    pub fn new(
        id: Option<String>,
        kind: Option<&str>,
        description: impl Into<String>,
        answer: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        let description = description.into();
        let answer = answer.into();
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| derive_id(kind, &description, &answer));
        Self {
            id,
            description,
            answer,
            difficulty,
        }
    }
}

/// Stable id from the identifying fields, joined with `_`
pub fn derive_id(kind: Option<&str>, description: &str, answer: &str) -> String {
    let parts: Vec<&str> = [kind.unwrap_or(""), description, answer]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    parts.join("_")
}

/// Difficulty-stratified snapshot of one theme's questions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSample {
    pub beginner: Vec<Question>,
    pub medium: Vec<Question>,
    pub hard: Vec<Question>,
}

impl ThemeSample {
    pub fn tier(&self, difficulty: Difficulty) -> &[Question] {
        match difficulty {
            Difficulty::Beginner => &self.beginner,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn tier_mut(&mut self, difficulty: Difficulty) -> &mut Vec<Question> {
        match difficulty {
            Difficulty::Beginner => &mut self.beginner,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }

    pub fn len(&self) -> usize {
        self.beginner.len() + self.medium.len() + self.hard.len()
    }

    /// True when no tier holds a question
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.beginner
            .iter()
            .chain(self.medium.iter())
            .chain(self.hard.iter())
    }
}
