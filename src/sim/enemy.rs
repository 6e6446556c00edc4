//! Enemy archetypes and the director that spawns them
//!
//! The director owns the active enemy: its archetype, its charge meter and the
//! behavior-specific state that lives only as long as that enemy does.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::question::{Difficulty, Question};
use crate::consts::{BOSS_COMPLETION_RATE, BOSS_HP};
use crate::error::CatalogError;

/// Behavior tag of an archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Plain enemy, one correct answer defeats it
    Normal,
    /// Swaps its question on every wrong answer
    Chameleon,
    /// Needs two correct answers; the first only breaks the shield
    Shield,
    /// Shows a decoy question until the player starts typing
    Mimic,
    /// Three staged hits across rising difficulty
    Boss,
}

/// Static enemy template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub charge_speed_multiplier: f64,
    pub behavior: Behavior,
    pub spawn_weight: u32,
    /// Only eligible once `level >= appears_after_level`
    #[serde(default)]
    pub appears_after_level: Option<u32>,
}

impl Archetype {
    pub fn new(name: &str, multiplier: f64, behavior: Behavior, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            charge_speed_multiplier: multiplier,
            behavior,
            spawn_weight: weight,
            appears_after_level: None,
        }
    }

    pub fn after_level(mut self, level: u32) -> Self {
        self.appears_after_level = Some(level);
        self
    }

    pub fn available_at(&self, level: u32) -> bool {
        self.appears_after_level.is_none_or(|min| level >= min)
    }
}

/// The five built-in archetypes
pub fn default_catalog() -> Vec<Archetype> {
    vec![
        Archetype::new("normal", 1.0, Behavior::Normal, 500),
        Archetype::new("chameleon", 1.0, Behavior::Chameleon, 20),
        Archetype::new("shield", 0.6, Behavior::Shield, 15).after_level(1),
        Archetype::new("mimic", 1.0, Behavior::Mimic, 15),
        Archetype::new("boss", 0.4, Behavior::Boss, 0).after_level(1),
    ]
}

/// Boss hit points and stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossState {
    pub hp: u8,
    pub stage: u8,
}

/// Result of landing a correct answer on the boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossHit {
    Staged(BossState),
    Defeated,
}

impl BossState {
    pub const fn fresh() -> Self {
        Self {
            hp: BOSS_HP,
            stage: 0,
        }
    }

    /// Tier of the question the boss asks at this stage
    pub fn stage_difficulty(&self) -> Difficulty {
        match self.stage {
            0 => Difficulty::Beginner,
            1 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn hit(self) -> BossHit {
        if self.hp > 1 {
            BossHit::Staged(BossState {
                hp: self.hp - 1,
                stage: self.stage + 1,
            })
        } else {
            BossHit::Defeated
        }
    }
}

impl Default for BossState {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Behavior-specific state of the active enemy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraState {
    pub shield_hit: bool,
    pub boss: Option<BossState>,
    pub mimic_revealed: bool,
    /// The question a mimic actually accepts
    pub real_question: Option<Question>,
}

/// The enemy currently charging at the player
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEnemy {
    pub archetype: Archetype,
    /// Threat meter in `[0, 1]`
    pub charge_rate: f64,
    pub extra: ExtraState,
}

/// Picks archetypes and tracks the active enemy
#[derive(Debug, Clone)]
pub struct EnemyDirector {
    catalog: Vec<Archetype>,
    active: ActiveEnemy,
}

impl Default for EnemyDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl EnemyDirector {
    pub fn new() -> Self {
        let catalog = default_catalog();
        let active = ActiveEnemy {
            archetype: catalog[0].clone(),
            charge_rate: 0.0,
            extra: ExtraState::default(),
        };
        Self { catalog, active }
    }

    pub fn with_catalog(catalog: Vec<Archetype>) -> Result<Self, CatalogError> {
        let first = catalog.first().cloned().ok_or(CatalogError::Empty)?;
        Ok(Self {
            catalog,
            active: ActiveEnemy {
                archetype: first,
                charge_rate: 0.0,
                extra: ExtraState::default(),
            },
        })
    }

    pub fn catalog(&self) -> &[Archetype] {
        &self.catalog
    }

    pub fn active(&self) -> &ActiveEnemy {
        &self.active
    }

    pub fn archetype(&self) -> &Archetype {
        &self.active.archetype
    }

    pub fn behavior(&self) -> Behavior {
        self.active.archetype.behavior
    }

    pub fn charge_rate(&self) -> f64 {
        self.active.charge_rate
    }

    /// Add to the meter, clamped to `[0, 1]`. Returns the new rate.
    pub fn charge(&mut self, delta: f64) -> f64 {
        if !delta.is_nan() {
            self.active.charge_rate = (self.active.charge_rate + delta).clamp(0.0, 1.0);
        }
        self.active.charge_rate
    }

    pub fn reset_charge(&mut self) {
        self.active.charge_rate = 0.0;
    }

    pub fn extra_state(&self) -> &ExtraState {
        &self.active.extra
    }

    pub fn extra_state_mut(&mut self) -> &mut ExtraState {
        &mut self.active.extra
    }

    /// Choose and activate the next archetype.
    ///
    /// At completion 0 mimics and bosses are excluded, below the boss threshold
    /// only bosses are, and from the threshold on the boss always spawns.
    pub fn select_next_archetype<R: Rng + ?Sized>(
        &mut self,
        level: u32,
        completion_rate: f64,
        rng: &mut R,
    ) -> &Archetype {
        let next = if completion_rate >= BOSS_COMPLETION_RATE {
            self.find(Behavior::Boss)
                .cloned()
                .unwrap_or_else(|| self.weighted(level, &[Behavior::Boss], rng))
        } else if completion_rate <= 0.0 {
            self.weighted(level, &[Behavior::Mimic, Behavior::Boss], rng)
        } else {
            self.weighted(level, &[Behavior::Boss], rng)
        };
        self.activate(next);
        &self.active.archetype
    }

    /// Switch to the catalog entry with `behavior`; false if there is none
    pub fn force_archetype(&mut self, behavior: Behavior) -> bool {
        match self.find(behavior).cloned() {
            Some(archetype) => {
                self.activate(archetype);
                true
            }
            None => false,
        }
    }

    fn activate(&mut self, archetype: Archetype) {
        let extra = ExtraState {
            boss: (archetype.behavior == Behavior::Boss).then(BossState::fresh),
            ..ExtraState::default()
        };
        log::debug!("Spawning {} enemy", archetype.name);
        self.active.archetype = archetype;
        self.active.extra = extra;
    }

    fn find(&self, behavior: Behavior) -> Option<&Archetype> {
        self.catalog.iter().find(|a| a.behavior == behavior)
    }

    fn weighted<R: Rng + ?Sized>(
        &self,
        level: u32,
        excluded: &[Behavior],
        rng: &mut R,
    ) -> Archetype {
        let permitted: Vec<&Archetype> = self
            .catalog
            .iter()
            .filter(|a| a.available_at(level) && !excluded.contains(&a.behavior))
            .collect();
        let permitted = if permitted.is_empty() {
            log::warn!("No permitted archetype at level {}, using full catalog", level);
            self.catalog.iter().collect()
        } else {
            permitted
        };
        weighted_pick(&permitted, rng)
            .unwrap_or(&self.catalog[0])
            .clone()
    }
}

/// Cumulative-weight draw; uniform when every weight is zero
fn weighted_pick<'a, R: Rng + ?Sized>(
    items: &[&'a Archetype],
    rng: &mut R,
) -> Option<&'a Archetype> {
    if items.is_empty() {
        return None;
    }
    let total: u64 = items.iter().map(|a| a.spawn_weight as u64).sum();
    if total == 0 {
        return Some(items[rng.random_range(0..items.len())]);
    }
    let roll = rng.random_range(0..total);
    let mut acc = 0u64;
    for &item in items {
        acc += item.spawn_weight as u64;
        if roll < acc {
            return Some(item);
        }
    }
    items.last().copied()
}
