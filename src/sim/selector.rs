//! Adaptive question selection
//!
//! The completion rate (correct answers / sample size) picks a difficulty
//! weight band; empty tiers are zeroed and the rest renormalised; a roulette
//! draw picks the tier and a uniform draw picks the question. Correctly
//! answered questions leave the pool for good and join the candidate pool.

use std::collections::HashSet;

use rand::Rng;

use super::question::{Difficulty, Question, ThemeSample};

/// Probability mass per tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierWeights {
    pub beginner: f64,
    pub medium: f64,
    pub hard: f64,
}

impl TierWeights {
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

    /// Weight band for a completion rate
    pub fn for_completion(rate: f64) -> Self {
        if rate < 0.2 {
            Self::new(0.8, 0.15, 0.05)
        } else if rate < 0.4 {
            Self::new(0.6, 0.3, 0.1)
        } else if rate < 0.6 {
            Self::new(0.3, 0.5, 0.2)
        } else if rate < 0.8 {
            Self::new(0.2, 0.5, 0.3)
        } else {
            Self::new(0.1, 0.3, 0.6)
        }
    }

    /// Zero the weights of empty tiers and renormalise to 1.
    /// Returns `None` when nothing is left.
    pub fn masked(&self, available: [bool; 3]) -> Option<Self> {
        let pick = |d: Difficulty| if available[d.index()] { self.get(d) } else { 0.0 };
        let (b, m, h) = (
            pick(Difficulty::Beginner),
            pick(Difficulty::Medium),
            pick(Difficulty::Hard),
        );
        let sum = b + m + h;
        if sum <= 0.0 {
            return None;
        }
        Some(Self::new(b / sum, m / sum, h / sum))
    }

    /// Cumulative-weight roulette for a uniform draw in `[0, 1)`
    pub fn roulette(&self, roll: f64) -> Difficulty {
        if roll < self.beginner {
            Difficulty::Beginner
        } else if roll < self.beginner + self.medium {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

/// Correct/total counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierStats {
    pub correct: u32,
    pub total: u32,
}

impl TierStats {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }
}

/// Answer accuracy per tier
#[derive(Debug, Clone, Default)]
pub struct AccuracyStats {
    tiers: [TierStats; 3],
}

impl AccuracyStats {
    fn record(&mut self, difficulty: Difficulty, correct: bool) {
        self.tiers[difficulty.index()].record(correct);
    }

    pub fn tier(&self, difficulty: Difficulty) -> TierStats {
        self.tiers[difficulty.index()]
    }

    pub fn overall(&self) -> TierStats {
        self.tiers.iter().fold(TierStats::default(), |acc, t| TierStats {
            correct: acc.correct + t.correct,
            total: acc.total + t.total,
        })
    }

    /// Accuracy as a percentage (0 when nothing answered yet)
    pub fn accuracy_percent(&self) -> f64 {
        let overall = self.overall();
        if overall.total == 0 {
            0.0
        } else {
            overall.correct as f64 * 100.0 / overall.total as f64
        }
    }
}

/// Chooses the next question from the active sample
#[derive(Debug, Clone)]
pub struct QuestionSelector {
    pool: ThemeSample,
    candidates: Vec<Question>,
    candidate_ids: HashSet<String>,
    sample_size: usize,
    theme_stats: AccuracyStats,
    session_stats: AccuracyStats,
}

impl QuestionSelector {
    pub fn new(sample_size: usize) -> Self {
        Self {
            pool: ThemeSample::default(),
            candidates: Vec::new(),
            candidate_ids: HashSet::new(),
            sample_size,
            theme_stats: AccuracyStats::default(),
            session_stats: AccuracyStats::default(),
        }
    }

    /// Replace the pool with a new theme sample; candidates and theme stats reset
    pub fn load_sample(&mut self, sample: ThemeSample) {
        self.pool = sample;
        self.clear_candidates();
        self.theme_stats = AccuracyStats::default();
    }

    pub fn pool(&self) -> &ThemeSample {
        &self.pool
    }

    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn answered_count(&self) -> usize {
        self.candidates.len()
    }

    /// Fraction of the configured sample size answered correctly
    pub fn completion_rate(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            self.candidates.len() as f64 / self.sample_size as f64
        }
    }

    /// Pick the next question, or `None` when every tier is empty
    pub fn select_question<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Question> {
        self.select_excluding(None, rng)
    }

    /// Like [`select_question`](Self::select_question) but never returns `exclude`
    /// unless it is the only question left
    pub fn select_other<R: Rng + ?Sized>(&self, exclude: &str, rng: &mut R) -> Option<Question> {
        self.select_excluding(Some(exclude), rng)
            .or_else(|| self.select_question(rng))
    }

    /// Band roulette over the tiers that still hold a question other than `exclude`
    fn select_excluding<R: Rng + ?Sized>(
        &self,
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Option<Question> {
        let tiers = Difficulty::ALL.map(|d| {
            self.pool
                .tier(d)
                .iter()
                .filter(|q| exclude != Some(q.id.as_str()))
                .collect::<Vec<_>>()
        });
        let available = tiers.each_ref().map(|t| !t.is_empty());
        let weights = TierWeights::for_completion(self.completion_rate()).masked(available)?;

        let mut tier = weights.roulette(rng.random::<f64>());
        if tiers[tier.index()].is_empty() {
            tier = *Difficulty::ALL
                .iter()
                .find(|d| !tiers[d.index()].is_empty())?;
        }

        let questions = &tiers[tier.index()];
        Some(questions[rng.random_range(0..questions.len())].clone())
    }

    /// Remove the question from its tier and credit it once
    pub fn record_correct(&mut self, question: &Question) {
        self.pool
            .tier_mut(question.difficulty)
            .retain(|q| q.id != question.id);

        self.theme_stats.record(question.difficulty, true);
        self.session_stats.record(question.difficulty, true);

        if self.candidate_ids.insert(question.id.clone()) {
            self.candidates.push(question.clone());
        }
    }

    /// The question stays selectable; only the stats change
    pub fn record_wrong(&mut self, question: &Question) {
        self.theme_stats.record(question.difficulty, false);
        self.session_stats.record(question.difficulty, false);
    }

    /// Already-answered questions of one tier
    pub fn candidates(&self, difficulty: Difficulty) -> Vec<&Question> {
        self.candidates
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .collect()
    }

    pub fn all_candidates(&self) -> &[Question] {
        &self.candidates
    }

    pub fn clear_candidates(&mut self) {
        self.candidates.clear();
        self.candidate_ids.clear();
    }

    /// Random already-answered question of a tier
    pub fn pick_candidate<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Option<Question> {
        let tier = self.candidates(difficulty);
        if tier.is_empty() {
            return None;
        }
        Some(tier[rng.random_range(0..tier.len())].clone())
    }

    pub fn theme_stats(&self) -> &AccuracyStats {
        &self.theme_stats
    }

    pub fn session_stats(&self) -> &AccuracyStats {
        &self.session_stats
    }
}
