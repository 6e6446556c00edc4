//! Monster Typer entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, HtmlInputElement, Response};

    use monster_typer::audio::AudioManager;
    use monster_typer::persistence::LocalStore;
    use monster_typer::platform::{MonotonicClock, PerformanceClock};
    use monster_typer::sim::{GameEvent, GameLoop};
    use monster_typer::{GameConfig, Settings};

    const CORPUS_URL: &str = "data.json";

    /// Game instance plus the browser handles it needs
    struct App {
        game: GameLoop,
        clock: PerformanceClock,
        settings: Settings,
        store: LocalStore,
        frame_handle: Option<i32>,
    }

    impl App {
        fn document() -> Option<Document> {
            web_sys::window()?.document()
        }

        fn set_text(document: &Document, id: &str, text: &str) {
            if let Some(el) = document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(document: &Document, id: &str, hidden: bool) {
            if let Some(el) = document.get_element_by_id(id) {
                let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = Self::document() else {
                return;
            };
            let state = self.game.state();

            Self::set_text(&document, "hud-lives", &state.lives.to_string());
            Self::set_text(&document, "hud-level", &state.level.to_string());
            Self::set_text(&document, "hud-theme", &state.current_theme);
            Self::set_text(
                &document,
                "hud-question",
                self.game
                    .displayed_question()
                    .map_or("", |q| q.description.as_str()),
            );
            Self::set_text(
                &document,
                "hud-timer",
                &format!("{:.1}", self.game.seconds_remaining().max(0.0)),
            );

            if let Some(input) = answer_input(&document) {
                let class = if self.game.input().is_wrong_flash_active() {
                    "shake"
                } else {
                    ""
                };
                let _ = input.set_attribute("class", class);
            }

            Self::set_hidden(&document, "game-over", !state.game_over);
            if state.game_over {
                Self::set_text(&document, "final-defeated", &state.total_defeated.to_string());
                Self::set_text(
                    &document,
                    "final-accuracy",
                    &format!(
                        "{:.0}%",
                        self.game.selector().session_stats().accuracy_percent()
                    ),
                );
            }
        }

        /// Keep the text field in step with the input boundary
        fn sync_input_field(&self) {
            let Some(input) = Self::document().as_ref().and_then(answer_input) else {
                return;
            };
            let typed = self.game.input().typed();
            if input.value() != typed {
                input.set_value(typed);
            }
        }

        fn log_events(&mut self) {
            for event in self.game.drain_events() {
                match event {
                    GameEvent::GameOver => log::info!("Game over"),
                    GameEvent::LevelUp { level } => log::info!("Level {}", level),
                    other => log::debug!("{:?}", other),
                }
            }
        }
    }

    fn answer_input(document: &Document) -> Option<HtmlInputElement> {
        document
            .get_element_by_id("answer-input")?
            .dyn_into::<HtmlInputElement>()
            .ok()
    }

    async fn fetch_text(url: &str) -> Option<String> {
        let window = web_sys::window()?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .ok()?
            .dyn_into()
            .ok()?;
        if !response.ok() {
            log::error!("Fetching {} failed with status {}", url, response.status());
            return None;
        }
        JsFuture::from(response.text().ok()?).await.ok()?.as_string()
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Monster Typer starting...");

        let Some(document) = App::document() else {
            log::error!("No document, cannot start");
            return;
        };

        let store = LocalStore::new();
        let settings = Settings::load(&store);
        let seed = js_sys::Date::now() as u64;
        let audio = Box::new(AudioManager::new(settings.master_volume));
        let mut game = match GameLoop::new(GameConfig::default(), seed, audio) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Invalid game configuration: {}", e);
                return;
            }
        };

        match fetch_text(CORPUS_URL).await {
            Some(json) => {
                game.load_corpus_json(&json);
            }
            None => log::error!("Could not load {}", CORPUS_URL),
        }

        App::set_hidden(&document, "loading", true);
        log::info!("Game initialized with seed: {}", seed);

        game.start();
        let app = Rc::new(RefCell::new(App {
            game,
            clock: PerformanceClock::new(),
            settings,
            store,
            frame_handle: None,
        }));

        setup_input(app.clone(), &document);
        setup_volume(app.clone(), &document);
        setup_restart_button(app.clone(), &document);
        setup_pagehide(app.clone());

        request_animation_frame(app);
    }

    fn setup_input(app: Rc<RefCell<App>>, document: &Document) {
        let Some(input) = answer_input(document) else {
            log::warn!("No #answer-input element");
            return;
        };
        let field = input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            a.game.on_input_change(&field.value());
            a.log_events();
            a.sync_input_field();
        });
        let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_volume(app: Rc<RefCell<App>>, document: &Document) {
        let Some(slider) = document
            .get_element_by_id("volume")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        slider.set_value(&app.borrow().settings.master_volume.to_string());

        let field = slider.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Ok(level) = field.value().parse::<f32>() else {
                return;
            };
            let mut a = app.borrow_mut();
            let App {
                game,
                settings,
                store,
                ..
            } = &mut *a;
            settings.update_volume(level);
            game.set_master_volume(settings.master_volume);
            if let Err(e) = settings.save(store) {
                log::error!("Failed to save settings: {}", e);
            }
        });
        let _ = slider.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_restart_button(app: Rc<RefCell<App>>, document: &Document) {
        let Some(btn) = document.get_element_by_id("restart-btn") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let seed = js_sys::Date::now() as u64;
            let idle = {
                let mut a = app.borrow_mut();
                a.game.restart(seed);
                a.sync_input_field();
                a.frame_handle.is_none()
            };
            log::info!("Game restarted with seed: {}", seed);
            if idle {
                request_animation_frame(app.clone());
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_pagehide(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            if let (Some(handle), Some(window)) = (a.frame_handle.take(), web_sys::window()) {
                let _ = window.cancel_animation_frame(handle);
            }
            a.game.teardown();
        });
        let _ = window
            .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let next = app.clone();
        let closure = Closure::once(move |_time: f64| {
            game_loop(next);
        });
        let handle = window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok();
        closure.forget();
        app.borrow_mut().frame_handle = handle;
    }

    fn game_loop(app: Rc<RefCell<App>>) {
        let running = {
            let mut a = app.borrow_mut();
            a.frame_handle = None;

            let now = a.clock.now();
            a.game.frame(now);
            a.log_events();
            a.sync_input_field();
            a.update_hud();
            a.game.is_running()
        };

        // Stopped loops wait for a restart
        if running {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Monster Typer (native) starting...");

    let mut args = std::env::args().skip(1);
    let result = match args.next() {
        Some(command) if command == "story" => match args.next() {
            Some(script_path) => headless::run_story(&script_path, parse_seed(args.next())),
            None => usage(),
        },
        Some(corpus_path) => {
            let seed = parse_seed(args.next());
            let config_path = args.next();
            headless::run(&corpus_path, seed, config_path.as_deref())
        }
        None => usage(),
    };

    if let Err(message) = result {
        log::error!("{}", message);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_seed(arg: Option<String>) -> u64 {
    arg.and_then(|s| s.parse().ok())
        .unwrap_or_else(|| monster_typer::platform::epoch_millis() as u64)
}

#[cfg(not(target_arch = "wasm32"))]
fn usage() -> ! {
    eprintln!("usage: monster-typer <corpus.json> [seed] [config.json]");
    eprintln!("       monster-typer story <script.json> [seed]");
    std::process::exit(2);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Auto-play runner: a simulated typist against the real loop
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::Duration;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use monster_typer::GameConfig;
    use monster_typer::audio::RecordingSink;
    use monster_typer::audio::SoundEffect;
    use monster_typer::persistence::MemoryStore;
    use monster_typer::platform::{ManualClock, MonotonicClock};
    use monster_typer::sim::{GameEvent, GameLoop};
    use monster_typer::story::{ProgressStore, Script, StorageProgressStore, StoryNavigator};

    /// Answers attempted before giving up on reaching game over
    const MAX_ANSWERS: u32 = 2000;
    /// How often the typist gets it right
    const ACCURACY: f64 = 0.8;
    /// Frame length used to step the clock
    const FRAME: Duration = Duration::from_millis(16);
    /// Scene steps before a looping story is abandoned
    const MAX_STORY_STEPS: u32 = 500;
    /// Simulated reading time per story step, in milliseconds
    const STORY_STEP_MS: f64 = 1500.0;

    pub fn run(corpus_path: &str, seed: u64, config_path: Option<&str>) -> Result<(), String> {
        let config = match config_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read {}: {}", path, e))?;
                GameConfig::from_json(&json).map_err(|e| format!("Invalid config: {}", e))?
            }
            None => GameConfig::default(),
        };

        let sound = RecordingSink::new();
        let mut game = GameLoop::new(config, seed, Box::new(sound.clone()))
            .map_err(|e| format!("Invalid config: {}", e))?;

        let json = std::fs::read_to_string(corpus_path)
            .map_err(|e| format!("Failed to read {}: {}", corpus_path, e))?;
        if !game.load_corpus_json(&json) {
            return Err(format!("{} is not a usable corpus", corpus_path));
        }

        log::info!("Auto-play with seed: {}", seed);
        let mut typist = Pcg32::seed_from_u64(seed ^ 0x5eed);
        let clock = ManualClock::new();
        game.start();
        game.frame(clock.now());

        let mut answers = 0;
        while game.is_running() && answers < MAX_ANSWERS {
            // Think for a while, letting the meter charge
            let think = Duration::from_millis(typist.random_range(300..4000));
            let mut waited = Duration::ZERO;
            while waited < think && game.is_running() {
                clock.advance(FRAME);
                waited += FRAME;
                game.frame(clock.now());
            }
            report(&mut game);
            if !game.is_running() {
                break;
            }

            let target = game.input().current_answer_text().to_string();
            if target.is_empty() {
                continue;
            }
            let attempt = if typist.random_bool(ACCURACY) {
                target
            } else {
                "#".repeat(target.chars().count())
            };
            game.on_input_change(&attempt);
            answers += 1;
            report(&mut game);
        }

        let state = game.state();
        let stats = game.selector().session_stats();
        log::info!(
            "Finished: level {}, {} defeated, {} lives left, accuracy {:.0}% over {} answers",
            state.level,
            state.total_defeated,
            state.lives,
            stats.accuracy_percent(),
            answers
        );
        log::info!(
            "Sounds: {} accepted, {} wrong, {} defeated",
            sound.count(SoundEffect::Accepted),
            sound.count(SoundEffect::WrongAnswer),
            sound.count(SoundEffect::Defeated)
        );
        game.teardown();
        Ok(())
    }

    /// Read a story script through to an ending with a simulated reader
    pub fn run_story(script_path: &str, seed: u64) -> Result<(), String> {
        let json = std::fs::read_to_string(script_path)
            .map_err(|e| format!("Failed to read {}: {}", script_path, e))?;
        let script = Script::from_json(&json).map_err(|e| format!("Invalid story: {}", e))?;
        let story_id = std::path::Path::new(script_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("story")
            .to_string();

        log::info!("Story '{}' with seed: {}", story_id, seed);
        let mut store = StorageProgressStore::new(MemoryStore::new());
        let mut reader = Pcg32::seed_from_u64(seed ^ 0x5eed);
        let navigator = play_story(&story_id, script, &mut store, &mut reader);

        let progress = navigator.progress();
        log::info!(
            "Finished '{}': {} of {} answers correct, {} dialogue lines",
            story_id,
            progress.correct_answers(),
            progress.answers.len(),
            progress.dialogue_history.len()
        );
        Ok(())
    }

    pub(crate) fn play_story<R: Rng>(
        story_id: &str,
        script: Script,
        store: &mut impl ProgressStore,
        reader: &mut R,
    ) -> StoryNavigator {
        let mut now = monster_typer::platform::epoch_millis();
        let mut navigator = StoryNavigator::resume(story_id, script, store, now);

        let mut steps = 0;
        while steps < MAX_STORY_STEPS {
            let Some(scene) = navigator.current_scene().cloned() else {
                break;
            };
            if !scene.dialogue.is_empty() {
                log::info!("{}: {}", scene.character, scene.dialogue);
            }
            now += STORY_STEP_MS;
            match scene.answer_key() {
                Some(key) => {
                    let attempt = if reader.random_bool(ACCURACY) {
                        key.text.clone()
                    } else {
                        "#".repeat(key.text.chars().count().max(1))
                    };
                    let correct = navigator.submit_answer(&attempt, now);
                    log::info!("Typed '{}': {:?}", attempt.trim(), correct);
                }
                None => navigator.advance(None, now),
            }
            navigator.persist(store);
            steps += 1;
        }

        if !navigator.is_ended() {
            log::warn!("Story '{}' still running after {} steps", story_id, steps);
        }
        navigator
    }

    fn report(game: &mut GameLoop) {
        for event in game.drain_events() {
            match event {
                GameEvent::SampleStarved => log::warn!("No questions left in any theme"),
                GameEvent::GameOver
                | GameEvent::LevelUp { .. }
                | GameEvent::ThemeRotated { .. }
                | GameEvent::BossDefeated
                | GameEvent::LifeLost { .. } => log::info!("{:?}", event),
                other => log::debug!("{:?}", other),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const SCRIPT: &str = r#"[
            {"id": 0, "character": "Mira", "dialogue": "A monster blocks the bridge."},
            {"id": 1, "type": "question", "character": "Mira", "dialogue": "Which word scares it?",
             "answer": {"text": "courage", "correctIndex": 2, "incorrectIndex": 3}},
            {"id": 2, "type": "correctED", "character": "Mira", "dialogue": "It flees."},
            {"id": 3, "type": "wrongED", "character": "Mira", "dialogue": "It stays."}
        ]"#;

        #[test]
        fn test_story_runs_to_an_ending() {
            let script = Script::from_json(SCRIPT).unwrap();
            let mut store = StorageProgressStore::new(MemoryStore::new());
            let mut reader = Pcg32::seed_from_u64(3);
            let navigator = play_story("bridge", script, &mut store, &mut reader);

            assert!(navigator.is_ended());
            let progress = navigator.progress();
            assert_eq!(progress.answers.len(), 1);
            assert!(progress.dialogue_history.len() >= 3);
            assert!(store.load_progress("bridge").is_none());
        }

        #[test]
        fn test_looping_story_stops_at_step_limit() {
            let looping = r#"[
                {"id": 0, "character": "Mira", "dialogue": "Again."},
                {"id": 1, "type": "question", "dialogue": "Say it",
                 "answer": {"text": "loop", "correctIndex": 0, "incorrectIndex": 0}}
            ]"#;
            let script = Script::from_json(looping).unwrap();
            let mut store = StorageProgressStore::new(MemoryStore::new());
            let mut reader = Pcg32::seed_from_u64(9);
            let navigator = play_story("loop", script, &mut store, &mut reader);

            assert!(!navigator.is_ended());
            assert_eq!(navigator.progress().answers.len(), MAX_STORY_STEPS as usize / 2);
            assert!(store.load_progress("loop").is_some());
        }
    }
}
