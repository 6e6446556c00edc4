//! Theme rotation and per-theme sampling
//!
//! Themes are visited round-robin from `remaining_themes`. When the queue runs
//! dry it is refilled from the full pool in shuffled order. Each rotation draws
//! a fresh, bounded, difficulty-stratified sample without replacement.

use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index;

use super::corpus::Corpus;
use super::question::{Difficulty, ThemeSample};
use super::state::{GameStatePatch, GameStateStore};
use crate::config::{GameConfig, SamplingRatios};
use crate::error::CorpusError;

/// Owns the corpus and the sample for the active theme
#[derive(Debug, Clone)]
pub struct ThemeSampler {
    corpus: Corpus,
    theme_pool: Vec<String>,
    sample_size: usize,
    ratios: SamplingRatios,
    advanced_after: usize,
    sample: ThemeSample,
}

impl ThemeSampler {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            corpus: Corpus::new(),
            theme_pool: config.theme_pool.clone(),
            sample_size: config.sample_size,
            ratios: config.sampling_ratios,
            advanced_after: config.advanced_after_rotations,
            sample: ThemeSample::default(),
        }
    }

    /// Install a loaded corpus. A failed load leaves an empty corpus behind.
    pub fn load_corpus(&mut self, source: Result<Corpus, CorpusError>) -> bool {
        match source {
            Ok(corpus) => {
                log::info!("Loaded corpus with {} themes", corpus.theme_count());
                self.corpus = corpus;
                true
            }
            Err(e) => {
                log::error!("Failed to load theme data: {}", e);
                self.corpus = Corpus::new();
                self.sample = ThemeSample::default();
                false
            }
        }
    }

    pub fn load_json(&mut self, json: &str) -> bool {
        self.load_corpus(Corpus::from_json(json))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn theme_pool(&self) -> &[String] {
        &self.theme_pool
    }

    /// Sample for the active theme (empty until the first rotation)
    pub fn sample(&self) -> &ThemeSample {
        &self.sample
    }

    /// Complete the current theme and move to the next one.
    ///
    /// Returns `None` only when the theme pool itself is empty.
    pub fn rotate_to_next_theme<R: Rng + ?Sized>(
        &mut self,
        store: &mut GameStateStore,
        rng: &mut R,
    ) -> Option<String> {
        let state = store.state();
        let mut completed = state.completed_themes.clone();
        if !state.current_theme.is_empty() {
            completed.push(state.current_theme.clone());
        }

        let mut remaining = state.remaining_themes.clone();
        if remaining.is_empty() {
            if self.theme_pool.is_empty() {
                log::error!("Theme pool is empty, cannot rotate");
                return None;
            }
            let mut refill = self.theme_pool.clone();
            refill.shuffle(rng);
            log::info!("Refilling theme pool ({} themes)", refill.len());
            remaining = refill.into();
        }

        let next = remaining.pop_front()?;
        let rotations = completed.len();
        store.update(GameStatePatch {
            current_theme: Some(next.clone()),
            remaining_themes: Some(remaining),
            completed_themes: Some(completed),
            ..Default::default()
        });

        self.create_sample(&next, rotations, rng);
        log::info!(
            "Rotated to theme '{}' ({} questions sampled)",
            next,
            self.sample.len()
        );
        Some(next)
    }

    /// Draw a new sample for `theme`, replacing the current one
    pub fn create_sample<R: Rng + ?Sized>(
        &mut self,
        theme: &str,
        completed_rotations: usize,
        rng: &mut R,
    ) -> &ThemeSample {
        let ratios = self
            .ratios
            .for_rotations(completed_rotations, self.advanced_after);
        let mut sample = ThemeSample::default();

        match self.corpus.theme(theme) {
            Some(questions) => {
                for difficulty in Difficulty::ALL {
                    let tier = questions.tier(difficulty);
                    let wanted =
                        (self.sample_size as f64 * ratios.get(difficulty)).floor() as usize;
                    let count = wanted.min(tier.len());
                    if count < wanted {
                        log::debug!(
                            "Theme '{}' has only {} {} questions ({} wanted)",
                            theme,
                            tier.len(),
                            difficulty.as_str(),
                            wanted
                        );
                    }
                    let drawn = sample.tier_mut(difficulty);
                    drawn.extend(
                        index::sample(rng, tier.len(), count)
                            .into_iter()
                            .map(|i| tier[i].clone()),
                    );
                }
            }
            None => log::warn!("Theme '{}' not found in corpus", theme),
        }

        self.sample = sample;
        &self.sample
    }
}
