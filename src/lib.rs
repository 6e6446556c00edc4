//! Monster Typer - a typing challenge game
//!
//! Core modules:
//! - `sim`: Deterministic Challenge Mode simulation (charge clock, spawning, question selection)
//! - `story`: Story Mode scene navigation and saved progress
//! - `audio`: Sound effect boundary (Web Audio on wasm, silent/recording natively)
//! - `persistence`: Key/value storage boundary (LocalStorage on web)
//! - `platform`: Monotonic clock sources
//! - `config`: Data-driven game balance
//! - `settings`: Persisted player preferences

pub mod audio;
pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod story;

pub use config::GameConfig;
pub use error::{CatalogError, ConfigError, CorpusError, ScriptError, StorageError};
pub use settings::Settings;

/// Game configuration constants (defaults for [`GameConfig`])
pub mod consts {
    /// Lives at the start of a run
    pub const INITIAL_LIVES: u32 = 3;
    /// Defeats needed to advance one level
    pub const ENEMIES_PER_LEVEL: u32 = 5;
    /// Logic tick interval in milliseconds
    pub const CHARGE_INTERVAL_MS: u64 = 300;
    /// Charge added per tick at level 1
    pub const INITIAL_CHARGE_SPEED: f64 = 0.03;
    /// Linear charge speed growth per level
    pub const DIFFICULTY_MULTIPLIER: f64 = 0.1;
    /// Questions drawn per theme sample
    pub const SAMPLE_SIZE: usize = 50;
    /// Completed rotations before the advanced sampling ratios apply
    pub const ADVANCED_AFTER_ROTATIONS: usize = 3;

    /// Flat charge added by a wrong answer once the penalty level is reached
    pub const WRONG_ANSWER_PENALTY: f64 = 0.3;
    /// First level at which wrong answers are penalised
    pub const PENALTY_FROM_LEVEL: u32 = 4;
    /// How long the wrong-answer shake stays active
    pub const WRONG_FLASH_MS: u64 = 300;

    /// Maximum logic ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame deltas longer than this are clamped (tab switches, breakpoints)
    pub const MAX_FRAME_MS: u64 = 1000;

    /// Completion rate at which the boss takes over spawning
    pub const BOSS_COMPLETION_RATE: f64 = 0.3;
    /// Boss hit points at spawn
    pub const BOSS_HP: u8 = 3;

    /// Themes rotated through, in their unshuffled order
    pub const THEME_POOL: [&str; 20] = [
        "animal",
        "art",
        "body and health",
        "clothes",
        "crime",
        "education",
        "describe",
        "food",
        "house",
        "money",
        "nature",
        "actions",
        "appearence",
        "personality",
        "politics",
        "relationships",
        "shopping",
        "technology",
        "travel",
        "work",
    ];
}
