//! Player input boundary
//!
//! Holds the target answer and the text typed so far. A submission fires only
//! once the typed text is exactly as long as the target.

use super::question::Difficulty;

/// Result of feeding a keystroke's worth of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Still typing
    Pending,
    /// Length matched the target; carries the submitted text
    Submitted(String),
}

#[derive(Debug, Clone, Default)]
pub struct PlayerInput {
    target: String,
    target_len: usize,
    difficulty: Option<Difficulty>,
    text: String,
    wrong_flash: bool,
}

impl PlayerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new target answer. Clears typed text and the wrong flash.
    pub fn update_current_answer(&mut self, answer: &str, difficulty: Difficulty) {
        self.target = answer.to_string();
        self.target_len = answer.chars().count();
        self.difficulty = Some(difficulty);
        self.text.clear();
        self.wrong_flash = false;
    }

    /// Feed the full current contents of the input field
    pub fn on_input_change(&mut self, raw: &str) -> InputEvent {
        if self.target_len == 0 || raw.chars().count() != self.target_len {
            self.text = raw.to_string();
            return InputEvent::Pending;
        }
        self.text.clear();
        InputEvent::Submitted(raw.to_string())
    }

    pub fn clear_input(&mut self) {
        self.text.clear();
        self.wrong_flash = false;
    }

    /// Forget the target entirely
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current_answer_text(&self) -> &str {
        &self.target
    }

    pub fn current_difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Text typed since the last submission
    pub fn typed(&self) -> &str {
        &self.text
    }

    pub fn is_wrong_flash_active(&self) -> bool {
        self.wrong_flash
    }

    pub fn set_wrong_flash(&mut self, active: bool) {
        self.wrong_flash = active;
    }
}
