//! Game configuration. Every field has a default so a host page may override
//! any subset through a JSON object passed to `start_game_with_config`.

use serde::{Deserialize, Serialize};

use crate::chart::{ChartEntry, builtin_catalog};
use crate::error::ConfigError;
use crate::judge::{JudgeParams, JudgmentWindows};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub windows: JudgmentWindows,
    pub hit_radius: f64,
    pub approach_ms: f64,
    /// Outer radius of the approach circle when a note first appears (px).
    pub max_approach_radius: f64,
    pub hit_sound: String,
    pub ranking_key: String,
    pub ranking_len: usize,
    pub charts: Vec<ChartEntry>,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            windows: JudgmentWindows::new(),
            hit_radius: 45.0,
            approach_ms: 1000.0,
            max_approach_radius: 180.0,
            hit_sound: "sounds/maou_se_system14.mp3".to_string(),
            ranking_key: "circle-beat.ranking".to_string(),
            ranking_len: crate::ranking::MAX_ENTRIES,
            charts: builtin_catalog(),
            canvas_width: 800,
            canvas_height: 600,
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.windows.validate()?;
        for (field, value) in [
            ("hit_radius", self.hit_radius),
            ("approach_ms", self.approach_ms),
            ("max_approach_radius", self.max_approach_radius),
            ("ranking_len", self.ranking_len as f64),
        ] {
            if value <= 0.0 || value.is_nan() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }

    pub fn judge_params(&self) -> JudgeParams {
        JudgeParams {
            windows: self.windows,
            hit_radius: self.hit_radius,
            approach_ms: self.approach_ms,
        }
    }
}
