//! Deterministic Challenge Mode simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (time comes in as elapsed `Duration`s)
//! - Seeded RNG only
//! - No rendering or platform dependencies (sound goes through `SoundSink`)

pub mod behavior;
pub mod corpus;
pub mod enemy;
pub mod game;
pub mod input;
pub mod question;
pub mod selector;
pub mod state;
pub mod theme;
pub mod timer;

pub use behavior::{BehaviorResolver, ExtraPatch, Outcome, QuestionSource, resolver_for};
pub use corpus::{Corpus, ThemeQuestions};
pub use enemy::{
    ActiveEnemy, Archetype, Behavior, BossHit, BossState, EnemyDirector, ExtraState,
    default_catalog,
};
pub use game::{GameLoop, LoopPhase};
pub use input::{InputEvent, PlayerInput};
pub use question::{Difficulty, Question, ThemeSample};
pub use selector::{AccuracyStats, QuestionSelector, TierStats, TierWeights};
pub use state::{GameEvent, GameState, GameStatePatch, GameStateStore, StateUpdate};
pub use theme::ThemeSampler;
pub use timer::{FixedStep, TimerAction, TimerId, Timers};
