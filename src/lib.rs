//! Circle Beat core crate.
//!
//! Click-rhythm gameplay: notes from a chart appear as shrinking approach
//! circles synced to a track and are judged by click timing. The judgment
//! engine, session controller, ranking and recorder are plain Rust and run
//! natively; the `web` module wires them to the DOM, canvas and Web Audio.

use wasm_bindgen::prelude::*;

pub mod chart;
pub mod clock;
pub mod config;
pub mod editor;
pub mod error;
pub mod judge;
mod logging;
pub mod ranking;
pub mod render;
pub mod session;
pub mod web;

pub use chart::{Chart, ChartEntry, Note};
pub use config::GameConfig;
pub use judge::{JudgeEngine, JudgeEvent, JudgeParams, Judgement, JudgmentWindows, RunStats};
pub use ranking::Ranking;
pub use session::{Session, SessionState};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Start the game page with built-in defaults.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::start_game(GameConfig::default())
}

/// Start the game page with a JSON config overriding any subset of defaults.
#[wasm_bindgen]
pub fn start_game_with_config(config_json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(config_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?;
    web::start_game(config)
}

/// Start the tap-along recorder against `track_url`.
#[wasm_bindgen]
pub fn start_editor(track_url: &str) -> Result<(), JsValue> {
    web::start_editor(track_url)
}

/// Re-sort and bound a ranking held by the page, e.g. before display.
#[wasm_bindgen]
pub fn normalize_ranking(scores: Vec<f64>) -> Vec<f64> {
    let scores = scores
        .into_iter()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s as u64);
    Ranking::from_scores(scores, ranking::MAX_ENTRIES)
        .scores()
        .iter()
        .map(|&s| s as f64)
        .collect()
}
