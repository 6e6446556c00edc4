//! Per-behavior answer resolution
//!
//! Each [`Behavior`] maps to a resolver that inspects the active enemy's
//! [`ExtraState`] and returns an [`Outcome`]. The game loop applies every
//! outcome the same way, whichever behavior produced it.

use super::enemy::{Behavior, BossHit, BossState, ExtraState};
use super::question::Difficulty;
use super::state::GameEvent;

/// Where a replacement question comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    /// A fresh question from the active sample
    Pool,
    /// An already-answered question of this tier
    Candidate(Difficulty),
}

/// Changes to the active enemy's extra state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraPatch {
    pub shield_hit: Option<bool>,
    pub boss: Option<BossState>,
}

impl ExtraPatch {
    pub fn apply(self, extra: &mut ExtraState) {
        if let Some(hit) = self.shield_hit {
            extra.shield_hit = hit;
        }
        if let Some(boss) = self.boss {
            extra.boss = Some(boss);
        }
    }
}

/// What the game loop should do after an answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Skip the default defeat (or default wrong) handling
    pub intercepts_default: bool,
    pub next_question: Option<QuestionSource>,
    pub state_patch: Option<ExtraPatch>,
    pub bonus_lives: u32,
    pub rotate_theme: bool,
    pub reset_charge: bool,
    pub events: Vec<GameEvent>,
}

impl Outcome {
    /// No override: the default handling runs
    pub fn passthrough() -> Self {
        Self::default()
    }
}

pub trait BehaviorResolver {
    fn on_correct(&self, extra: &ExtraState) -> Outcome;

    fn on_wrong(&self, _extra: &ExtraState) -> Outcome {
        Outcome::passthrough()
    }
}

struct NormalResolver;
struct ChameleonResolver;
struct ShieldResolver;
struct MimicResolver;
struct BossResolver;

impl BehaviorResolver for NormalResolver {
    fn on_correct(&self, _extra: &ExtraState) -> Outcome {
        Outcome::passthrough()
    }
}

impl BehaviorResolver for ChameleonResolver {
    fn on_correct(&self, _extra: &ExtraState) -> Outcome {
        Outcome::passthrough()
    }

    fn on_wrong(&self, _extra: &ExtraState) -> Outcome {
        Outcome {
            next_question: Some(QuestionSource::Pool),
            ..Outcome::default()
        }
    }
}

impl BehaviorResolver for ShieldResolver {
    fn on_correct(&self, extra: &ExtraState) -> Outcome {
        if extra.shield_hit {
            return Outcome::passthrough();
        }
        Outcome {
            intercepts_default: true,
            next_question: Some(QuestionSource::Pool),
            state_patch: Some(ExtraPatch {
                shield_hit: Some(true),
                ..ExtraPatch::default()
            }),
            events: vec![GameEvent::ShieldBroken],
            ..Outcome::default()
        }
    }
}

// The decoy lives entirely in the spawn and reveal path.
impl BehaviorResolver for MimicResolver {
    fn on_correct(&self, _extra: &ExtraState) -> Outcome {
        Outcome::passthrough()
    }
}

impl BehaviorResolver for BossResolver {
    fn on_correct(&self, extra: &ExtraState) -> Outcome {
        match extra.boss.unwrap_or_default().hit() {
            BossHit::Staged(next) => Outcome {
                intercepts_default: true,
                next_question: Some(QuestionSource::Candidate(next.stage_difficulty())),
                state_patch: Some(ExtraPatch {
                    boss: Some(next),
                    ..ExtraPatch::default()
                }),
                reset_charge: true,
                events: vec![GameEvent::BossStaged {
                    hp: next.hp,
                    stage: next.stage,
                }],
                ..Outcome::default()
            },
            BossHit::Defeated => Outcome {
                bonus_lives: 1,
                rotate_theme: true,
                events: vec![GameEvent::BossDefeated],
                ..Outcome::default()
            },
        }
    }
}

/// Resolver for a behavior tag
pub fn resolver_for(behavior: Behavior) -> &'static dyn BehaviorResolver {
    match behavior {
        Behavior::Normal => &NormalResolver,
        Behavior::Chameleon => &ChameleonResolver,
        Behavior::Shield => &ShieldResolver,
        Behavior::Mimic => &MimicResolver,
        Behavior::Boss => &BossResolver,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss_extra() -> ExtraState {
        ExtraState {
            boss: Some(BossState::fresh()),
            ..ExtraState::default()
        }
    }

    #[test]
    fn test_normal_and_mimic_never_intercept() {
        for behavior in [Behavior::Normal, Behavior::Mimic] {
            let resolver = resolver_for(behavior);
            assert_eq!(resolver.on_correct(&ExtraState::default()), Outcome::passthrough());
            assert_eq!(resolver.on_wrong(&ExtraState::default()), Outcome::passthrough());
        }
    }

    #[test]
    fn test_chameleon_swaps_on_wrong_only() {
        let resolver = resolver_for(Behavior::Chameleon);
        let wrong = resolver.on_wrong(&ExtraState::default());
        assert!(!wrong.intercepts_default);
        assert_eq!(wrong.next_question, Some(QuestionSource::Pool));
        assert_eq!(resolver.on_correct(&ExtraState::default()), Outcome::passthrough());
    }

    #[test]
    fn test_shield_needs_two_hits() {
        let resolver = resolver_for(Behavior::Shield);
        let mut extra = ExtraState::default();

        let first = resolver.on_correct(&extra);
        assert!(first.intercepts_default);
        assert_eq!(first.next_question, Some(QuestionSource::Pool));
        assert!(!first.reset_charge);
        first.state_patch.unwrap().apply(&mut extra);
        assert!(extra.shield_hit);

        let second = resolver.on_correct(&extra);
        assert!(!second.intercepts_default);
    }

    #[test]
    fn test_boss_walks_three_stages_with_one_reward() {
        let resolver = resolver_for(Behavior::Boss);
        let mut extra = boss_extra();
        let mut bonus = 0;
        let mut rotations = 0;
        let mut tiers = Vec::new();

        for _ in 0..3 {
            let outcome = resolver.on_correct(&extra);
            bonus += outcome.bonus_lives;
            rotations += outcome.rotate_theme as u32;
            if let Some(QuestionSource::Candidate(d)) = outcome.next_question {
                tiers.push(d);
            }
            if let Some(patch) = outcome.state_patch {
                patch.apply(&mut extra);
            }
        }

        assert_eq!(tiers, vec![Difficulty::Medium, Difficulty::Hard]);
        assert_eq!(bonus, 1);
        assert_eq!(rotations, 1);
        assert_eq!(extra.boss, Some(BossState { hp: 1, stage: 2 }));
    }
}
