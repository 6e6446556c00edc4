//! Error types
//!
//! Content and storage failures are recoverable and are normally logged by the
//! caller rather than propagated. Only catalog misconfiguration stops a session
//! from being built.

use thiserror::Error;

/// Failure to load the question corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to parse corpus: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("corpus contains no themes")]
    Empty,
}

/// Invalid game configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("theme pool is empty")]
    EmptyThemePool,
    #[error("sample size must be greater than zero")]
    ZeroSampleSize,
    #[error("charge interval must be greater than zero")]
    ZeroInterval,
    #[error("sampling ratios for {which} are invalid (each must be in 0..=1, sum at most 1)")]
    InvalidRatio { which: &'static str },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Invalid enemy catalog
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("enemy catalog is empty")]
    Empty,
}

/// Failure at the key/value storage boundary
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid story script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to parse story script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("story script has no scenes")]
    Empty,
    #[error("scene id {0} appears more than once")]
    DuplicateScene(u32),
}
