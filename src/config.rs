//! Data-driven game balance
//!
//! Every field has a default from [`crate::consts`], so a JSON document only
//! needs to name the values it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::Difficulty;

/// Fraction of the sample drawn from each difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRatios {
    pub beginner: f64,
    pub medium: f64,
    pub hard: f64,
}

impl TierRatios {
    pub const fn new(beginner: f64, medium: f64, hard: f64) -> Self {
        Self {
            beginner,
            medium,
            hard,
        }
    }

    pub fn get(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Beginner => self.beginner,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    fn is_valid(&self) -> bool {
        let parts = [self.beginner, self.medium, self.hard];
        parts.iter().all(|r| (0.0..=1.0).contains(r)) && parts.iter().sum::<f64>() <= 1.0 + 1e-9
    }
}

/// Sampling ratios before and after the advanced threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingRatios {
    pub initial: TierRatios,
    pub advanced: TierRatios,
}

impl SamplingRatios {
    /// `advanced` once `completed_rotations` reaches `advanced_after`
    pub fn for_rotations(&self, completed_rotations: usize, advanced_after: usize) -> TierRatios {
        if completed_rotations >= advanced_after {
            self.advanced
        } else {
            self.initial
        }
    }
}

impl Default for SamplingRatios {
    fn default() -> Self {
        Self {
            initial: TierRatios::new(0.4, 0.4, 0.2),
            advanced: TierRatios::new(0.2, 0.4, 0.4),
        }
    }
}

/// Challenge Mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_lives: u32,
    pub charge_interval_ms: u64,
    pub initial_charge_speed: f64,
    pub difficulty_multiplier: f64,
    pub sample_size: usize,
    /// Defeats per level; `None` disables level progression
    pub enemies_per_level: Option<u32>,
    pub theme_pool: Vec<String>,
    pub sampling_ratios: SamplingRatios,
    pub advanced_after_rotations: usize,
    pub wrong_answer_penalty: f64,
    pub penalty_from_level: u32,
    pub wrong_flash_ms: u64,
    pub max_substeps: u32,
    pub max_frame_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_lives: INITIAL_LIVES,
            charge_interval_ms: CHARGE_INTERVAL_MS,
            initial_charge_speed: INITIAL_CHARGE_SPEED,
            difficulty_multiplier: DIFFICULTY_MULTIPLIER,
            sample_size: SAMPLE_SIZE,
            enemies_per_level: Some(ENEMIES_PER_LEVEL),
            theme_pool: THEME_POOL.iter().map(|t| t.to_string()).collect(),
            sampling_ratios: SamplingRatios::default(),
            advanced_after_rotations: ADVANCED_AFTER_ROTATIONS,
            wrong_answer_penalty: WRONG_ANSWER_PENALTY,
            penalty_from_level: PENALTY_FROM_LEVEL,
            wrong_flash_ms: WRONG_FLASH_MS,
            max_substeps: MAX_SUBSTEPS,
            max_frame_ms: MAX_FRAME_MS,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theme_pool.is_empty() {
            return Err(ConfigError::EmptyThemePool);
        }
        if self.sample_size == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        if self.charge_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.sampling_ratios.initial.is_valid() {
            return Err(ConfigError::InvalidRatio { which: "initial" });
        }
        if !self.sampling_ratios.advanced.is_valid() {
            return Err(ConfigError::InvalidRatio { which: "advanced" });
        }
        Ok(())
    }

    pub fn charge_interval(&self) -> Duration {
        Duration::from_millis(self.charge_interval_ms)
    }

    pub fn wrong_flash(&self) -> Duration {
        Duration::from_millis(self.wrong_flash_ms)
    }

    pub fn max_frame(&self) -> Duration {
        Duration::from_millis(self.max_frame_ms)
    }

    /// Charge added per tick at `level`, before the enemy multiplier
    pub fn base_charge_speed(&self, level: u32) -> f64 {
        let steps = level.saturating_sub(1) as f64;
        self.initial_charge_speed * (1.0 + self.difficulty_multiplier * steps)
    }

    /// Ratios for a sample drawn after `completed_rotations` themes
    pub fn ratios_for(&self, completed_rotations: usize) -> TierRatios {
        self.sampling_ratios
            .for_rotations(completed_rotations, self.advanced_after_rotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.theme_pool.len(), 20);
        assert_eq!(config.charge_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let config = GameConfig::from_json(r#"{"initial_lives": 5, "theme_pool": ["food"]}"#)
            .expect("valid config");
        assert_eq!(config.initial_lives, 5);
        assert_eq!(config.theme_pool, vec!["food".to_string()]);
        assert_eq!(config.sample_size, SAMPLE_SIZE);
    }

    #[test]
    fn test_rejects_empty_pool_and_bad_ratios() {
        assert!(matches!(
            GameConfig::from_json(r#"{"theme_pool": []}"#),
            Err(ConfigError::EmptyThemePool)
        ));
        let bad = r#"{"sampling_ratios": {
            "initial": {"beginner": 0.9, "medium": 0.9, "hard": 0.0},
            "advanced": {"beginner": 0.2, "medium": 0.4, "hard": 0.4}
        }}"#;
        assert!(matches!(
            GameConfig::from_json(bad),
            Err(ConfigError::InvalidRatio { which: "initial" })
        ));
        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_base_charge_speed_is_linear_in_level() {
        let config = GameConfig::default();
        assert!((config.base_charge_speed(1) - 0.03).abs() < 1e-12);
        assert!((config.base_charge_speed(2) - 0.033).abs() < 1e-12);
        assert!((config.base_charge_speed(11) - 0.06).abs() < 1e-12);
        assert!(config.base_charge_speed(5) > config.base_charge_speed(4));
    }

    #[test]
    fn test_ratios_switch_after_three_rotations() {
        let config = GameConfig::default();
        assert_eq!(config.ratios_for(0), config.sampling_ratios.initial);
        assert_eq!(config.ratios_for(2), config.sampling_ratios.initial);
        assert_eq!(config.ratios_for(3), config.sampling_ratios.advanced);
    }
}
