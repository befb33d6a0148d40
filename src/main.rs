//! Beaver Bash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, PointerEvent};

    use beaver_bash::audio::{CuePlayer, WebAudioCuePlayer};
    use beaver_bash::error::Result;
    use beaver_bash::records::LocalRecordStore;
    use beaver_bash::sim::GamePhase;
    use beaver_bash::web::{DomPresenter, cell_index_of, document, require};
    use beaver_bash::{Session, SessionConfig, Settings};

    /// Longest frame step fed to the clock (ms)
    const MAX_FRAME_MS: f64 = 250.0;

    type WebSession = Session<DomPresenter, WebAudioCuePlayer, LocalRecordStore>;

    /// Game instance holding all state
    struct Game {
        session: WebSession,
        settings: Settings,
        last_time: f64,
        /// Sub-millisecond remainder carried between frames
        carry: f64,
    }

    impl Game {
        /// Advance the session clock by the real time since the last frame
        fn update(&mut self, time: f64) {
            if self.last_time > 0.0 {
                let elapsed = (time - self.last_time).clamp(0.0, MAX_FRAME_MS) + self.carry;
                let whole = elapsed.floor();
                self.carry = elapsed - whole;
                self.session.advance(whole as u64);
            }
            self.last_time = time;
            self.session.cues_mut().pump();
        }

        /// Enter: start from the intro, restart after game over
        fn confirm(&mut self) {
            match self.session.phase() {
                GamePhase::Intro => self.session.start(),
                GamePhase::GameOver => self.session.reset(),
                GamePhase::Playing | GamePhase::Paused => {}
            }
        }
    }

    /// Run `f` against the game unless it is already borrowed
    fn with_game(game: &Rc<RefCell<Game>>, f: impl FnOnce(&mut Game)) {
        match game.try_borrow_mut() {
            Ok(mut g) => f(&mut g),
            Err(_) => log::warn!("Dropped re-entrant input"),
        }
    }

    pub fn run() -> Result<()> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Beaver Bash starting...");

        let document = document()?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let presenter = DomPresenter::new(document.clone(), settings.effective_screen_shake())?;
        let cues = WebAudioCuePlayer::new(&settings);
        let session = Session::new(
            SessionConfig::from_settings(&settings, seed),
            presenter,
            cues,
            LocalRecordStore,
        )?;

        let game = Rc::new(RefCell::new(Game {
            session,
            settings,
            last_time: 0.0,
            carry: 0.0,
        }));

        setup_buttons(&document, game.clone())?;
        setup_input_handlers(&document, game.clone())?;
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Beaver Bash running!");
        Ok(())
    }

    fn on_click(el: &web_sys::Element, game: Rc<RefCell<Game>>, f: fn(&mut Game)) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            with_game(&game, f);
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &web_sys::Document, game: Rc<RefCell<Game>>) -> Result<()> {
        on_click(&require(document, "start-btn")?, game.clone(), |g| {
            g.session.start()
        });
        on_click(&require(document, "restart-btn")?, game.clone(), |g| {
            g.session.reset()
        });
        // Pause controls are optional in the markup
        for id in ["pause-btn", "resume-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                on_click(&btn, game.clone(), |g| g.session.toggle_pause());
            }
        }
        Ok(())
    }

    fn setup_input_handlers(document: &web_sys::Document, game: Rc<RefCell<Game>>) -> Result<()> {
        // Cell strikes - delegated so the grid can be rebuilt per level
        {
            let game = game.clone();
            let grid = require(document, "grid")?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let Some(index) = event.target().as_ref().and_then(cell_index_of) else {
                    return;
                };
                event.prevent_default();
                with_game(&game, |g| {
                    g.session.hit(index);
                });
            });
            let _ = grid
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().ok_or(beaver_bash::InitError::NoWindow)?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                with_game(&game, |g| match key.as_str() {
                    "Escape" | "p" | "P" => g.session.toggle_pause(),
                    "Enter" => g.confirm(),
                    digit => {
                        if let Some(n) = digit.parse::<usize>().ok().filter(|n| *n >= 1) {
                            g.session.hit(n - 1);
                        }
                    }
                });
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        Ok(())
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        fn auto_pause(g: &mut Game, why: &str) {
            if g.settings.mute_on_blur && g.session.phase() == GamePhase::Playing {
                g.session.pause();
                log::info!("Auto-paused ({})", why);
            }
        }

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    with_game(&game, |g| auto_pause(g, "tab hidden"));
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                with_game(&game, |g| auto_pause(g, "window blur"));
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        with_game(&game, |g| g.update(time));
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Startup failed: {}", e);
        wasm_bindgen::throw_str(&e.to_string());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Beaver Bash (native) starting...");
    log::info!("Native mode runs a headless autoplay demo - run with `trunk serve` for the web version");

    // beaver-bash [seed] [tuning.json]
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xBEA7E5);
    let tuning_path = args.next();

    match autoplay::run(seed, tuning_path.as_deref()) {
        Ok(summary) => println!("\n{}", summary),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: a simulated player with human-ish reaction times
#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use std::collections::BTreeMap;

    use beaver_bash::audio::SilentCuePlayer;
    use beaver_bash::InitError;
    use beaver_bash::error::Result;
    use beaver_bash::presentation::LogPresenter;
    use beaver_bash::sim::{Cell, GamePhase, Millis};
    use beaver_bash::{MemoryRecordStore, Session, SessionConfig, Settings, Tuning};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Clock step between player decisions (ms)
    const FRAME_MS: Millis = 16;
    /// Hard stop for a run that never ends (ms)
    const MAX_RUN_MS: Millis = 10 * 60 * 1000;

    pub fn run(seed: u64, tuning_path: Option<&str>) -> Result<String> {
        let mut settings = Settings::load();
        if let Some(path) = tuning_path {
            let json = std::fs::read_to_string(path).map_err(|source| InitError::TuningFile {
                path: path.to_string(),
                source,
            })?;
            settings.custom_tuning = Some(Tuning::from_json(&json)?);
            log::info!("Using tuning from '{}'", path);
        }
        let mut session = Session::new(
            SessionConfig::from_settings(&settings, seed),
            LogPresenter::default(),
            SilentCuePlayer::default(),
            MemoryRecordStore::new(),
        )?;
        let mut player = Pcg32::seed_from_u64(seed ^ 0x5EED);

        session.start();

        // When the simulated player will react to each live target
        let mut reactions: BTreeMap<Cell, Millis> = BTreeMap::new();

        while session.phase() == GamePhase::Playing && session.now() < MAX_RUN_MS {
            session.advance(FRAME_MS);
            let now = session.now();

            reactions.retain(|cell, _| session.state().is_active(*cell));
            for cell in session.state().active_cells().collect::<Vec<_>>() {
                reactions
                    .entry(cell)
                    .or_insert_with(|| now + player.random_range(250..1_100));
            }

            let due: Vec<Cell> = reactions
                .iter()
                .filter(|(_, at)| **at <= now)
                .map(|(cell, _)| *cell)
                .collect();
            for cell in due {
                reactions.remove(&cell);
                // Occasionally fat-finger the neighbouring hole
                let cells = session.level().cell_count();
                let target = if player.random_bool(0.03) {
                    (cell.0 + 1) % cells
                } else {
                    cell.0
                };
                session.hit(target);
            }
        }

        let state = session.state();
        Ok(format!(
            "Level '{}' | score {} | level {} | best combo {} | {} hits, {} misses, {} wrong | {} cues | {:.1}s",
            session.level().name,
            state.score,
            state.level,
            state.max_combo,
            state.hits,
            state.misses,
            state.wrong_hits,
            session.cues().tones_played,
            session.now() as f64 / 1000.0
        ))
    }
}
