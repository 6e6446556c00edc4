//! Challenge Mode game loop
//!
//! `GameLoop` owns every controller and the seeded RNG. Frames feed elapsed
//! time into a [`FixedStep`] accumulator; each due tick advances the active
//! enemy's charge. Answer submissions are routed through the behavior
//! resolvers and one shared post-processing step.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::behavior::{Outcome, QuestionSource, resolver_for};
use super::corpus::Corpus;
use super::enemy::{ActiveEnemy, Archetype, Behavior, EnemyDirector};
use super::input::{InputEvent, PlayerInput};
use super::question::{Difficulty, Question};
use super::selector::QuestionSelector;
use super::state::{GameEvent, GameState, GameStatePatch, GameStateStore};
use super::theme::ThemeSampler;
use super::timer::{FixedStep, TimerAction, TimerId, Timers};
use crate::audio::{SoundEffect, SoundSink};
use crate::config::GameConfig;
use crate::error::{ConfigError, CorpusError};

/// Where the loop is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Built but not started
    Idle,
    Running,
    /// Game over latched
    Stopped,
    /// Torn down; every call is a no-op
    Disposed,
}

pub struct GameLoop {
    config: GameConfig,
    rng: Pcg32,
    store: GameStateStore,
    sampler: ThemeSampler,
    selector: QuestionSelector,
    director: EnemyDirector,
    input: PlayerInput,
    step: FixedStep,
    timers: Timers,
    flash_timer: Option<TimerId>,
    sound: Box<dyn SoundSink>,
    /// Question on screen (a mimic's decoy until revealed)
    displayed: Option<Question>,
    events: Vec<GameEvent>,
    last_frame: Option<Duration>,
    phase: LoopPhase,
}

impl GameLoop {
    pub fn new(
        config: GameConfig,
        seed: u64,
        sound: Box<dyn SoundSink>,
    ) -> Result<Self, ConfigError> {
        Self::with_director(config, seed, sound, EnemyDirector::new())
    }

    /// Build with a custom archetype catalog
    pub fn with_catalog(
        config: GameConfig,
        seed: u64,
        sound: Box<dyn SoundSink>,
        catalog: Vec<Archetype>,
    ) -> Result<Self, ConfigError> {
        let director = EnemyDirector::with_catalog(catalog)?;
        Self::with_director(config, seed, sound, director)
    }

    fn with_director(
        config: GameConfig,
        seed: u64,
        sound: Box<dyn SoundSink>,
        director: EnemyDirector,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng: Pcg32::seed_from_u64(seed),
            store: GameStateStore::new(config.initial_lives),
            sampler: ThemeSampler::new(&config),
            selector: QuestionSelector::new(config.sample_size),
            director,
            input: PlayerInput::new(),
            step: FixedStep::new(config.charge_interval(), config.max_substeps),
            timers: Timers::new(),
            flash_timer: None,
            sound,
            displayed: None,
            events: Vec::new(),
            last_frame: None,
            phase: LoopPhase::Idle,
            config,
        })
    }

    /// Install the question corpus. A failure leaves an empty corpus.
    pub fn load_corpus(&mut self, source: Result<Corpus, CorpusError>) -> bool {
        self.sampler.load_corpus(source)
    }

    pub fn load_corpus_json(&mut self, json: &str) -> bool {
        self.sampler.load_json(json)
    }

    /// Rotate to the first theme and spawn the first enemy
    pub fn start(&mut self) {
        if self.phase != LoopPhase::Idle {
            return;
        }
        log::info!("Starting challenge");
        self.phase = LoopPhase::Running;
        self.rotate_theme();
        self.spawn_next();
    }

    /// New run with a fresh seed, keeping the loaded corpus
    pub fn restart(&mut self, seed: u64) {
        if self.phase == LoopPhase::Disposed {
            return;
        }
        self.rng = Pcg32::seed_from_u64(seed);
        self.store.reset();
        self.selector = QuestionSelector::new(self.config.sample_size);
        self.director.reset_charge();
        self.input.reset();
        self.release_scheduling();
        self.displayed = None;
        self.events.clear();
        self.phase = LoopPhase::Idle;
        self.start();
    }

    /// Stop for good: clears timers and the accumulator
    pub fn teardown(&mut self) {
        if self.phase == LoopPhase::Disposed {
            return;
        }
        log::info!("Tearing down challenge");
        self.release_scheduling();
        self.phase = LoopPhase::Disposed;
    }

    /// Drive from a monotonic timestamp; the first call only primes
    pub fn frame(&mut self, now: Duration) -> u32 {
        if self.phase == LoopPhase::Disposed {
            return 0;
        }
        let elapsed = match self.last_frame {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.last_frame = Some(now);
        self.advance(elapsed)
    }

    /// Feed elapsed time; runs due timers and ticks. Returns ticks run.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.phase != LoopPhase::Running {
            return 0;
        }
        let elapsed = elapsed.min(self.config.max_frame());

        for action in self.timers.advance(elapsed) {
            match action {
                TimerAction::ClearWrongFlash => {
                    self.input.set_wrong_flash(false);
                    self.flash_timer = None;
                }
            }
        }

        let due = self.step.advance(elapsed);
        let mut ran = 0;
        for _ in 0..due {
            if self.phase != LoopPhase::Running {
                break;
            }
            self.tick();
            ran += 1;
        }
        ran
    }

    /// One logic tick of the charge clock
    pub fn tick(&mut self) {
        if self.phase != LoopPhase::Running {
            return;
        }
        let rate = self.director.charge(self.charge_speed());
        if rate >= 1.0 {
            self.on_threshold();
        }
    }

    /// Charge per tick for the active enemy at the current level
    pub fn charge_speed(&self) -> f64 {
        self.config.base_charge_speed(self.store.state().level)
            * self.director.archetype().charge_speed_multiplier
    }

    /// Seconds until the meter fills at the current speed
    pub fn seconds_remaining(&self) -> f64 {
        let speed = self.charge_speed();
        if speed <= 0.0 {
            return f64::INFINITY;
        }
        let ticks = (1.0 - self.director.charge_rate()) / speed;
        ticks * self.config.charge_interval().as_secs_f64()
    }

    /// Feed the whole contents of the input field
    pub fn on_input_change(&mut self, raw: &str) {
        if self.phase != LoopPhase::Running {
            return;
        }
        if !raw.is_empty() {
            self.reveal_mimic();
        }
        if let InputEvent::Submitted(text) = self.input.on_input_change(raw) {
            self.submit_answer(&text);
        }
    }

    /// Compare `text` with the accepted answer and dispatch
    pub fn submit_answer(&mut self, text: &str) {
        if self.phase != LoopPhase::Running {
            return;
        }
        let Some(question) = self.accepted_question().cloned() else {
            return;
        };
        if text == question.answer {
            self.on_correct(question);
        } else {
            self.on_wrong(question);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == LoopPhase::Running
    }

    pub fn enemy(&self) -> &ActiveEnemy {
        self.director.active()
    }

    pub fn displayed_question(&self) -> Option<&Question> {
        self.displayed.as_ref()
    }

    /// The question whose answer is actually accepted
    pub fn accepted_question(&self) -> Option<&Question> {
        self.director
            .extra_state()
            .real_question
            .as_ref()
            .or(self.displayed.as_ref())
    }

    pub fn input(&self) -> &PlayerInput {
        &self.input
    }

    pub fn selector(&self) -> &QuestionSelector {
        &self.selector
    }

    pub fn sampler(&self) -> &ThemeSampler {
        &self.sampler
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn set_master_volume(&mut self, level: f32) {
        self.sound.set_master_volume(level);
    }

    fn on_threshold(&mut self) {
        let lives = self.store.state().lives.saturating_sub(1);
        self.store.update(GameStatePatch {
            lives: Some(lives),
            ..Default::default()
        });
        self.events.push(GameEvent::LifeLost { lives });
        log::debug!("Charge full, {} lives left", lives);

        if lives == 0 {
            self.store.update(GameStatePatch {
                game_over: Some(true),
                ..Default::default()
            });
            self.sound.play(SoundEffect::Defeated);
            self.events.push(GameEvent::GameOver);
            log::info!(
                "Game over at level {} with {} defeated",
                self.store.state().level,
                self.store.state().total_defeated
            );
            self.release_scheduling();
            self.phase = LoopPhase::Stopped;
            self.director.reset_charge();
            return;
        }

        self.input.clear_input();
        if self.director.behavior() != Behavior::Boss {
            self.spawn_next();
        }
        self.director.reset_charge();
    }

    fn on_correct(&mut self, question: Question) {
        self.sound.play(SoundEffect::Accepted);
        self.selector.record_correct(&question);
        let behavior = self.director.behavior();
        log::debug!("Correct answer '{}' against {:?}", question.answer, behavior);

        let outcome = resolver_for(behavior).on_correct(self.director.extra_state());
        let Outcome {
            intercepts_default,
            next_question,
            state_patch,
            bonus_lives,
            rotate_theme,
            reset_charge,
            events,
        } = outcome;

        if let Some(patch) = state_patch {
            patch.apply(self.director.extra_state_mut());
        }
        self.events.extend(events);

        if intercepts_default {
            if let Some(source) = next_question {
                self.replace_question(source, &question.id);
            }
            if reset_charge {
                self.director.reset_charge();
            }
            return;
        }

        self.store.update_with(|s| GameState {
            defeated: s.defeated + 1,
            total_defeated: s.total_defeated + 1,
            ..s.clone()
        });
        self.events.push(GameEvent::EnemyDefeated { behavior });
        self.director.reset_charge();
        self.check_level_up();

        if bonus_lives > 0 {
            let lives = self.store.state().lives + bonus_lives;
            self.store.update(GameStatePatch {
                lives: Some(lives),
                ..Default::default()
            });
            self.events.push(GameEvent::BonusLife { lives });
        }
        if rotate_theme {
            self.rotate_theme();
        }
        self.spawn_next();
    }

    fn on_wrong(&mut self, question: Question) {
        self.sound.play(SoundEffect::WrongAnswer);
        self.selector.record_wrong(&question);
        self.events.push(GameEvent::WrongAnswer {
            question_id: question.id.clone(),
        });
        self.input.clear_input();

        let outcome = resolver_for(self.director.behavior()).on_wrong(self.director.extra_state());
        if let Some(patch) = outcome.state_patch {
            patch.apply(self.director.extra_state_mut());
        }
        self.events.extend(outcome.events);
        if let Some(source) = outcome.next_question {
            self.replace_question(source, &question.id);
            if let Some(q) = &self.displayed {
                self.events.push(GameEvent::QuestionSwapped {
                    question_id: q.id.clone(),
                });
            }
        }

        if self.store.state().level >= self.config.penalty_from_level {
            self.director.charge(self.config.wrong_answer_penalty);
        }
        // After any swap, since a new target clears the flash
        self.start_wrong_flash();
    }

    fn start_wrong_flash(&mut self) {
        if let Some(id) = self.flash_timer.take() {
            self.timers.cancel(id);
        }
        self.input.set_wrong_flash(true);
        self.flash_timer = Some(
            self.timers
                .schedule(self.config.wrong_flash(), TimerAction::ClearWrongFlash),
        );
    }

    fn check_level_up(&mut self) {
        let Some(per_level) = self.config.enemies_per_level.filter(|n| *n > 0) else {
            return;
        };
        let state = self.store.state();
        if state.defeated < per_level {
            return;
        }
        let level = state.level + 1;
        self.store.update(GameStatePatch {
            level: Some(level),
            defeated: Some(0),
            ..Default::default()
        });
        self.events.push(GameEvent::LevelUp { level });
        log::info!("Level up to {}", level);
    }

    fn rotate_theme(&mut self) {
        if let Some(theme) = self.sampler.rotate_to_next_theme(&mut self.store, &mut self.rng) {
            self.selector.load_sample(self.sampler.sample().clone());
            self.events.push(GameEvent::ThemeRotated { theme });
        }
    }

    /// Next pool question, rotating past exhausted or empty themes
    fn draw_question(&mut self) -> Option<Question> {
        if let Some(q) = self.selector.select_question(&mut self.rng) {
            return Some(q);
        }
        for _ in 0..self.config.theme_pool.len() {
            log::warn!(
                "Sample for '{}' exhausted, rotating theme",
                self.store.state().current_theme
            );
            self.rotate_theme();
            if let Some(q) = self.selector.select_question(&mut self.rng) {
                return Some(q);
            }
        }
        log::error!("No questions available in any theme");
        self.events.push(GameEvent::SampleStarved);
        None
    }

    fn spawn_next(&mut self) {
        if self.phase != LoopPhase::Running {
            return;
        }
        let level = self.store.state().level;
        let rate = self.selector.completion_rate();
        self.director.select_next_archetype(level, rate, &mut self.rng);

        match self.draw_question() {
            Some(question) => self.dress_enemy(question),
            None => {
                self.displayed = None;
                self.director.extra_state_mut().real_question = None;
                self.input.reset();
            }
        }
    }

    /// Present `question` in the way the active archetype shows it
    fn dress_enemy(&mut self, question: Question) {
        let behavior = self.director.behavior();
        let question = match behavior {
            Behavior::Boss => self
                .selector
                .pick_candidate(Difficulty::Beginner, &mut self.rng)
                .unwrap_or(question),
            _ => question,
        };

        if behavior == Behavior::Mimic {
            let decoy = self
                .selector
                .select_other(&question.id, &mut self.rng)
                .unwrap_or_else(|| question.clone());
            self.input
                .update_current_answer(&question.answer, question.difficulty);
            self.director.extra_state_mut().real_question = Some(question.clone());
            self.displayed = Some(decoy);
        } else {
            self.director.extra_state_mut().real_question = None;
            self.set_question(question.clone());
        }

        self.events.push(GameEvent::EnemySpawned {
            behavior,
            question_id: question.id,
        });
    }

    fn set_question(&mut self, question: Question) {
        self.input
            .update_current_answer(&question.answer, question.difficulty);
        self.displayed = Some(question);
    }

    fn replace_question(&mut self, source: QuestionSource, current_id: &str) {
        let next = match source {
            QuestionSource::Pool => self
                .selector
                .select_other(current_id, &mut self.rng)
                .or_else(|| self.draw_question()),
            QuestionSource::Candidate(difficulty) => self
                .selector
                .pick_candidate(difficulty, &mut self.rng)
                .or_else(|| self.any_candidate())
                .or_else(|| self.draw_question()),
        };
        if let Some(question) = next {
            self.set_question(question);
        }
    }

    fn any_candidate(&mut self) -> Option<Question> {
        let all = self.selector.all_candidates();
        if all.is_empty() {
            return None;
        }
        Some(all[self.rng.random_range(0..all.len())].clone())
    }

    fn reveal_mimic(&mut self) {
        if self.director.behavior() != Behavior::Mimic
            || self.director.extra_state().mimic_revealed
        {
            return;
        }
        let extra = self.director.extra_state_mut();
        extra.mimic_revealed = true;
        if let Some(real) = extra.real_question.clone() {
            self.displayed = Some(real);
        }
        self.events.push(GameEvent::MimicRevealed);
    }

    fn release_scheduling(&mut self) {
        self.timers.clear();
        self.flash_timer = None;
        self.step.reset();
        self.last_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingSink;
    use crate::sim::enemy::BossState;

    const THEMES: [&str; 3] = ["food", "animal", "art"];

    fn corpus(per_tier: usize) -> Corpus {
        let mut corpus = Corpus::new();
        for theme in THEMES {
            for difficulty in Difficulty::ALL {
                for i in 0..per_tier {
                    let answer = format!("{}{}{}", theme, difficulty.as_str(), i);
                    let description = format!("clue for {}", answer);
                    corpus.insert(
                        theme,
                        Question::new(None, None, description, answer, difficulty),
                    );
                }
            }
        }
        corpus
    }

    fn config() -> GameConfig {
        GameConfig {
            theme_pool: THEMES.iter().map(|t| t.to_string()).collect(),
            sample_size: 20,
            ..GameConfig::default()
        }
    }

    fn only(behavior: Behavior) -> Vec<Archetype> {
        let mult = match behavior {
            Behavior::Shield => 0.6,
            Behavior::Boss => 0.4,
            _ => 1.0,
        };
        vec![Archetype::new("solo", mult, behavior, 1)]
    }

    fn started(config: GameConfig, catalog: Vec<Archetype>) -> (GameLoop, RecordingSink) {
        let sink = RecordingSink::new();
        let mut game =
            GameLoop::with_catalog(config, 7, Box::new(sink.clone()), catalog).expect("valid");
        assert!(game.load_corpus(Ok(corpus(10))));
        game.start();
        (game, sink)
    }

    fn answer(game: &GameLoop) -> String {
        game.accepted_question().expect("question").answer.clone()
    }

    fn wrong(game: &GameLoop) -> String {
        "#".repeat(answer(game).chars().count())
    }

    #[test]
    fn test_scenario_a_timeout_costs_a_life() {
        let cfg = GameConfig {
            initial_charge_speed: 0.05,
            ..config()
        };
        let (mut game, _) = started(cfg, only(Behavior::Normal));
        for _ in 0..19 {
            game.tick();
        }
        assert_eq!(game.state().lives, 3);
        assert!(game.enemy().charge_rate < 1.0);

        game.tick();
        assert_eq!(game.state().lives, 2);
        assert_eq!(game.enemy().charge_rate, 0.0);
        assert!(game.drain_events().contains(&GameEvent::LifeLost { lives: 2 }));
    }

    #[test]
    fn test_scenario_b_correct_answer() {
        let (mut game, sink) = started(config(), only(Behavior::Normal));
        game.tick();
        let before = game.accepted_question().cloned().unwrap();
        let remaining = game.selector().remaining();

        game.on_input_change(&before.answer);

        assert_eq!(sink.count(SoundEffect::Accepted), 1);
        assert_eq!(game.selector().answered_count(), 1);
        assert_eq!(game.selector().all_candidates()[0].id, before.id);
        assert_eq!(game.selector().remaining(), remaining - 1);
        assert_eq!(game.enemy().archetype.behavior, Behavior::Normal);
        assert_eq!(game.enemy().charge_rate, 0.0);
        assert_ne!(game.accepted_question().unwrap().id, before.id);
        assert_eq!(game.state().defeated, 1);
    }

    #[test]
    fn test_scenario_c_penalty_from_level_four() {
        for behavior in [Behavior::Normal, Behavior::Shield, Behavior::Boss] {
            let (mut game, sink) = started(config(), only(behavior));
            game.store.update(GameStatePatch {
                level: Some(4),
                ..Default::default()
            });
            let guess = wrong(&game);
            game.on_input_change(&guess);
            assert!(
                (game.enemy().charge_rate - 0.3).abs() < 1e-12,
                "{:?} penalty",
                behavior
            );
            assert_eq!(sink.count(SoundEffect::WrongAnswer), 1);

            game.tick();
            let expected = 0.3 + game.charge_speed();
            assert!((game.enemy().charge_rate - expected).abs() < 1e-12);

            for _ in 0..5 {
                let guess = wrong(&game);
                game.submit_answer(&guess);
            }
            assert_eq!(game.enemy().charge_rate, 1.0, "{:?} clamp", behavior);
        }
    }

    #[test]
    fn test_no_penalty_below_level_four() {
        let (mut game, _) = started(config(), only(Behavior::Normal));
        let guess = wrong(&game);
        game.submit_answer(&guess);
        assert_eq!(game.enemy().charge_rate, 0.0);
        assert_eq!(game.selector().answered_count(), 0);
    }

    #[test]
    fn test_wrong_flash_clears_after_delay() {
        let (mut game, _) = started(config(), only(Behavior::Normal));
        let guess = wrong(&game);
        game.submit_answer(&guess);
        assert!(game.input().is_wrong_flash_active());
        assert_eq!(game.pending_timers(), 1);

        game.advance(Duration::from_millis(200));
        assert!(game.input().is_wrong_flash_active());
        game.advance(Duration::from_millis(100));
        assert!(!game.input().is_wrong_flash_active());
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn test_teardown_releases_timers_and_freezes_state() {
        let (mut game, _) = started(config(), only(Behavior::Normal));
        let guess = wrong(&game);
        game.submit_answer(&guess);
        assert_eq!(game.pending_timers(), 1);

        game.teardown();
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(game.phase(), LoopPhase::Disposed);

        let snapshot = game.state().clone();
        assert_eq!(game.advance(Duration::from_secs(10)), 0);
        game.tick();
        let correct = answer(&game);
        game.on_input_change(&correct);
        assert_eq!(game.state(), &snapshot);
        assert!(game.input().is_wrong_flash_active());
    }

    #[test]
    fn test_frames_drive_ticks_through_accumulator() {
        let (mut game, _) = started(config(), only(Behavior::Normal));
        let mut ran = game.frame(Duration::from_millis(1000));
        assert_eq!(ran, 0);
        for i in 1..=60 {
            ran += game.frame(Duration::from_millis(1000 + i * 15));
        }
        // 900 ms at a 300 ms interval
        assert_eq!(ran, 3);
        assert!((game.enemy().charge_rate - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_game_over_latches_and_stops() {
        let cfg = GameConfig {
            initial_lives: 1,
            initial_charge_speed: 0.5,
            ..config()
        };
        let (mut game, sink) = started(cfg, only(Behavior::Normal));
        let guess = wrong(&game);
        game.submit_answer(&guess);
        game.tick();
        game.tick();

        assert!(game.state().game_over);
        assert_eq!(game.state().lives, 0);
        assert_eq!(game.phase(), LoopPhase::Stopped);
        assert_eq!(sink.count(SoundEffect::Defeated), 1);
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(game.advance(Duration::from_secs(5)), 0);
        game.tick();
        assert_eq!(sink.count(SoundEffect::Defeated), 1);
    }

    #[test]
    fn test_level_up_every_five_defeats() {
        let (mut game, _) = started(config(), only(Behavior::Normal));
        let base = game.charge_speed();
        for _ in 0..5 {
            let correct = answer(&game);
            game.submit_answer(&correct);
        }
        assert_eq!(game.state().level, 2);
        assert_eq!(game.state().defeated, 0);
        assert_eq!(game.state().total_defeated, 5);
        assert!(game.charge_speed() > base);
        assert!(game.drain_events().contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_shield_takes_two_correct_answers() {
        let (mut game, _) = started(config(), only(Behavior::Shield));
        let first = game.accepted_question().cloned().unwrap();
        game.submit_answer(&first.answer);

        assert_eq!(game.state().defeated, 0);
        assert!(game.enemy().extra.shield_hit);
        assert_ne!(game.accepted_question().unwrap().id, first.id);
        assert!(game.drain_events().contains(&GameEvent::ShieldBroken));

        let second = answer(&game);
        game.submit_answer(&second);
        assert_eq!(game.state().defeated, 1);
        assert!(!game.enemy().extra.shield_hit);
    }

    #[test]
    fn test_chameleon_swaps_on_wrong() {
        let (mut game, _) = started(config(), only(Behavior::Chameleon));
        let before = game.accepted_question().cloned().unwrap();
        let guess = wrong(&game);
        game.submit_answer(&guess);

        let after = game.accepted_question().cloned().unwrap();
        assert_ne!(after.id, before.id);
        assert_eq!(game.input().current_answer_text(), after.answer);
        assert!(
            game.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::QuestionSwapped { .. }))
        );
    }

    #[test]
    fn test_mimic_reveals_on_first_keystroke() {
        let (mut game, _) = started(config(), only(Behavior::Mimic));
        let real = game.accepted_question().cloned().unwrap();
        let decoy = game.displayed_question().cloned().unwrap();
        assert_ne!(decoy.id, real.id);
        assert_eq!(game.input().current_answer_text(), real.answer);

        let first: String = real.answer.chars().take(1).collect();
        game.on_input_change(&first);
        assert!(game.enemy().extra.mimic_revealed);
        assert_eq!(game.displayed_question().unwrap().id, real.id);
        assert!(game.drain_events().contains(&GameEvent::MimicRevealed));

        game.on_input_change(&real.answer);
        assert_eq!(game.state().defeated, 1);
    }

    #[test]
    fn test_boss_stages_reward_once() {
        let (mut game, _) = started(config(), only(Behavior::Boss));
        assert_eq!(game.enemy().extra.boss, Some(BossState::fresh()));
        game.drain_events();

        let lives = game.state().lives;
        let theme = game.state().current_theme.clone();
        for _ in 0..3 {
            let correct = answer(&game);
            game.submit_answer(&correct);
        }
        let events = game.drain_events();

        let staged: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::BossStaged { hp, .. } => Some(*hp),
                _ => None,
            })
            .collect();
        assert_eq!(staged, vec![2, 1]);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::BossDefeated).count(), 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::BonusLife { .. }))
                .count(),
            1
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::ThemeRotated { .. }))
                .count(),
            1
        );
        assert_eq!(game.state().lives, lives + 1);
        assert_ne!(game.state().current_theme, theme);
        assert_eq!(game.state().defeated, 1);
    }

    #[test]
    fn test_boss_is_exempt_from_timeout_respawn() {
        let cfg = GameConfig {
            initial_charge_speed: 1.0,
            ..config()
        };
        let (mut game, _) = started(cfg, only(Behavior::Boss));
        let question = game.accepted_question().cloned().unwrap();
        game.drain_events();
        for _ in 0..3 {
            game.tick();
        }
        assert_eq!(game.state().lives, 2);
        assert_eq!(game.accepted_question().unwrap().id, question.id);
        assert!(
            !game
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::EnemySpawned { .. }))
        );
    }

    #[test]
    fn test_exhausted_sample_rotates_theme() {
        let cfg = GameConfig {
            enemies_per_level: None,
            ..config()
        };
        let (mut game, _) = started(cfg, only(Behavior::Normal));
        let first_theme = game.state().current_theme.clone();
        let sample = game.selector().remaining();
        for _ in 0..sample {
            let correct = answer(&game);
            game.submit_answer(&correct);
        }
        assert_ne!(game.state().current_theme, first_theme);
        assert!(game.accepted_question().is_some());
        assert_eq!(game.state().level, 1);
    }

    #[test]
    fn test_empty_corpus_starves_without_panicking() {
        let sink = RecordingSink::new();
        let mut game = GameLoop::new(config(), 1, Box::new(sink)).unwrap();
        assert!(!game.load_corpus_json("{broken"));
        game.start();
        assert!(game.accepted_question().is_none());
        assert!(game.drain_events().contains(&GameEvent::SampleStarved));
        game.submit_answer("anything");
        for _ in 0..1000 {
            game.tick();
        }
        assert!(game.state().game_over);
    }

    #[test]
    fn test_seconds_remaining() {
        let (mut game, _) = started(config(), only(Behavior::Normal));
        assert!((game.seconds_remaining() - 10.0).abs() < 1e-9);
        game.tick();
        assert!((game.seconds_remaining() - 9.7).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_session() {
        let run = |seed| {
            let mut game = GameLoop::new(config(), seed, Box::new(RecordingSink::new())).unwrap();
            game.load_corpus(Ok(corpus(10)));
            game.start();
            let mut ids = Vec::new();
            for _ in 0..15 {
                let correct = answer(&game);
                ids.push(game.accepted_question().unwrap().id.clone());
                game.submit_answer(&correct);
            }
            (ids, game.state().clone())
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_invalid_config_and_catalog_are_rejected() {
        let bad = GameConfig {
            sample_size: 0,
            ..config()
        };
        assert!(matches!(
            GameLoop::new(bad, 1, Box::new(RecordingSink::new())),
            Err(ConfigError::ZeroSampleSize)
        ));
        assert!(matches!(
            GameLoop::with_catalog(config(), 1, Box::new(RecordingSink::new()), Vec::new()),
            Err(ConfigError::Catalog(_))
        ));
    }
}
