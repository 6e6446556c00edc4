//! Game state and its store
//!
//! `GameState` is only ever changed through [`GameStateStore::update`], which
//! accepts either a merge-patch or a functional transform.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::enemy::Behavior;

/// Session-level state owned by [`GameStateStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current level (starts at 1)
    pub level: u32,
    /// Remaining lives
    pub lives: u32,
    /// Terminal latch; once set it never clears
    pub game_over: bool,
    /// Enemies defeated since the last level-up
    pub defeated: u32,
    /// Enemies defeated over the whole run
    pub total_defeated: u32,
    /// Active theme ("" before the first rotation)
    pub current_theme: String,
    /// Round-robin queue of themes still to visit
    pub remaining_themes: VecDeque<String>,
    /// Themes already rotated away from
    pub completed_themes: Vec<String>,
}

impl GameState {
    pub fn new(initial_lives: u32) -> Self {
        Self {
            level: 1,
            lives: initial_lives,
            game_over: false,
            defeated: 0,
            total_defeated: 0,
            current_theme: String::new(),
            remaining_themes: VecDeque::new(),
            completed_themes: Vec::new(),
        }
    }
}

/// Merge-patch: only `Some` fields are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameStatePatch {
    pub level: Option<u32>,
    pub lives: Option<u32>,
    pub game_over: Option<bool>,
    pub defeated: Option<u32>,
    pub current_theme: Option<String>,
    pub remaining_themes: Option<VecDeque<String>>,
    pub completed_themes: Option<Vec<String>>,
}

impl GameStatePatch {
    fn apply(self, state: &GameState) -> GameState {
        let mut next = state.clone();
        if let Some(level) = self.level {
            next.level = level;
        }
        if let Some(lives) = self.lives {
            next.lives = lives;
        }
        if let Some(game_over) = self.game_over {
            next.game_over = game_over;
        }
        if let Some(defeated) = self.defeated {
            next.defeated = defeated;
        }
        if let Some(theme) = self.current_theme {
            next.current_theme = theme;
        }
        if let Some(remaining) = self.remaining_themes {
            next.remaining_themes = remaining;
        }
        if let Some(completed) = self.completed_themes {
            next.completed_themes = completed;
        }
        next
    }
}

/// An update accepted by the store
pub enum StateUpdate<'a> {
    Patch(GameStatePatch),
    Transform(Box<dyn FnOnce(&GameState) -> GameState + 'a>),
}

impl From<GameStatePatch> for StateUpdate<'_> {
    fn from(patch: GameStatePatch) -> Self {
        StateUpdate::Patch(patch)
    }
}

/// Exclusive owner of [`GameState`]
#[derive(Debug, Clone)]
pub struct GameStateStore {
    state: GameState,
    initial_lives: u32,
}

impl GameStateStore {
    pub fn new(initial_lives: u32) -> Self {
        Self {
            state: GameState::new(initial_lives),
            initial_lives,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply a patch or transform. Enforces `level >= 1` and the game-over latch.
    pub fn update<'a>(&mut self, update: impl Into<StateUpdate<'a>>) {
        let next = match update.into() {
            StateUpdate::Patch(patch) => patch.apply(&self.state),
            StateUpdate::Transform(f) => f(&self.state),
        };
        self.commit(next);
    }

    /// Functional form of [`update`](Self::update)
    pub fn update_with(&mut self, f: impl FnOnce(&GameState) -> GameState) {
        let next = f(&self.state);
        self.commit(next);
    }

    /// Back to a fresh run (the only way to leave game over)
    pub fn reset(&mut self) {
        self.state = GameState::new(self.initial_lives);
    }

    fn commit(&mut self, mut next: GameState) {
        if self.state.game_over && !next.game_over {
            log::warn!("Ignoring attempt to clear game over");
            next.game_over = true;
        }
        next.level = next.level.max(1);
        self.state = next;
    }
}

/// Notable things that happened during a tick or an answer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EnemySpawned { behavior: Behavior, question_id: String },
    EnemyDefeated { behavior: Behavior },
    ShieldBroken,
    BossStaged { hp: u8, stage: u8 },
    BossDefeated,
    BonusLife { lives: u32 },
    WrongAnswer { question_id: String },
    QuestionSwapped { question_id: String },
    MimicRevealed,
    LifeLost { lives: u32 },
    LevelUp { level: u32 },
    ThemeRotated { theme: String },
    /// No questions could be found in any theme
    SampleStarved,
    GameOver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_merges_only_named_fields() {
        let mut store = GameStateStore::new(3);
        store.update(GameStatePatch {
            lives: Some(2),
            current_theme: Some("food".into()),
            ..Default::default()
        });
        let state = store.state();
        assert_eq!(state.lives, 2);
        assert_eq!(state.current_theme, "food");
        assert_eq!(state.level, 1);
    }

    #[test]
    fn test_functional_update() {
        let mut store = GameStateStore::new(3);
        store.update_with(|s| GameState {
            defeated: s.defeated + 1,
            ..s.clone()
        });
        store.update(StateUpdate::Transform(Box::new(|s: &GameState| GameState {
            defeated: s.defeated + 1,
            ..s.clone()
        })));
        assert_eq!(store.state().defeated, 2);
    }

    #[test]
    fn test_game_over_is_a_latch() {
        let mut store = GameStateStore::new(1);
        store.update(GameStatePatch {
            game_over: Some(true),
            lives: Some(0),
            ..Default::default()
        });
        store.update(GameStatePatch {
            game_over: Some(false),
            ..Default::default()
        });
        assert!(store.state().game_over);
        store.update_with(|s| GameState {
            game_over: false,
            ..s.clone()
        });
        assert!(store.state().game_over);

        store.reset();
        assert!(!store.state().game_over);
        assert_eq!(store.state().lives, 1);
    }

    #[test]
    fn test_level_never_drops_below_one() {
        let mut store = GameStateStore::new(3);
        store.update(GameStatePatch {
            level: Some(0),
            ..Default::default()
        });
        assert_eq!(store.state().level, 1);
    }
}
