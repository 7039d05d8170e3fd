//! Browser bridge
//!
//! `WebGame` is what the page's script drives: it forwards the animation
//! frame, key presses and visibility changes, and reads back JSON snapshots
//! for its own renderer.

use wasm_bindgen::prelude::*;

use super::input::request_for_key;
use super::web_audio::WebAudio;
use super::{ImmediateLoader, RecordingRenderer, UiSink};
use crate::game::Game;
use crate::level::LevelTable;
use crate::sim::HudSnapshot;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Frog Crossing starting...");
}

/// Writes HUD values into elements by id
#[derive(Default)]
pub struct DomHud {
    last: Option<HudSnapshot>,
}

impl DomHud {
    fn set_text(document: &web_sys::Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }
}

impl UiSink for DomHud {
    fn publish(&mut self, hud: &HudSnapshot) {
        if self.last.as_ref() == Some(hud) {
            return;
        }
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        Self::set_text(&document, "score", &hud.score.to_string());
        Self::set_text(&document, "lives", &hud.lives.to_string());
        Self::set_text(&document, "level", &format!("{} {}", hud.level, hud.level_name));
        Self::set_text(
            &document,
            "frogs",
            &format!("{}/{}", hud.frogs_rescued, hud.frogs_needed),
        );
        if let Some(el) = document.get_element_by_id("danger") {
            if let Err(e) = el.set_attribute("data-level", &hud.danger.to_string()) {
                log::debug!("Failed to set danger level: {:?}", e);
            }
        }
        self.last = Some(hud.clone());
    }

    fn notify(&mut self, message: &str) {
        log::info!("{}", message);
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            Self::set_text(&document, "message", message);
        }
    }
}

type BrowserGame = Game<RecordingRenderer, WebAudio, DomHud, ImmediateLoader>;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    game: BrowserGame,
}

impl WebGame {
    fn build(seed: u64, levels: LevelTable, tuning: Tuning) -> Result<WebGame, JsValue> {
        let game = Game::new(
            seed,
            levels,
            tuning,
            RecordingRenderer::new(),
            WebAudio::new(),
            DomHud::default(),
            ImmediateLoader::new(),
        )
        .map_err(js_error)?;
        Ok(WebGame { game })
    }
}

#[wasm_bindgen]
impl WebGame {
    /// Game over the shipped levels
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<WebGame, JsValue> {
        Self::build(seed, LevelTable::builtin(), Tuning::default())
    }

    /// Game over custom level / tuning JSON (empty tuning string = defaults)
    pub fn with_config(seed: u64, levels_json: &str, tuning_json: &str) -> Result<WebGame, JsValue> {
        let levels = LevelTable::from_json(levels_json).map_err(js_error)?;
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).map_err(js_error)?
        };
        Self::build(seed, levels, tuning)
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.game.start(None).map_err(js_error)
    }

    pub fn restart(&mut self) -> Result<(), JsValue> {
        self.game.restart(None).map_err(js_error)
    }

    pub fn jump(&mut self, level: u32) -> Result<(), JsValue> {
        self.game.jump(level).map_err(js_error)
    }

    pub fn menu(&mut self) {
        self.game.return_to_menu();
    }

    /// Returns true if the key mapped to a game input
    pub fn key(&mut self, key: &str) -> bool {
        match request_for_key(key) {
            Some(request) => {
                self.game.push_input(request);
                true
            }
            None => false,
        }
    }

    pub fn frame(&mut self, now_ms: f64) {
        self.game.frame(now_ms);
    }

    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        self.game.set_visible(visible, now_ms);
    }

    pub fn hud_json(&self) -> String {
        serde_json::to_string(&self.game.hud()).unwrap_or_default()
    }

    /// Obstacle and player placements of the last frame
    pub fn frame_json(&self) -> String {
        serde_json::to_string(self.game.render().last_frame()).unwrap_or_default()
    }

    pub fn high_scores_json(&self) -> String {
        serde_json::to_string(self.game.high_scores()).unwrap_or_default()
    }
}
