//! Error types shared by the engine and the browser shell.

use thiserror::Error;

/// Failures while bringing a chart and its track into a playable state.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart request for '{url}' failed with status {status}")]
    FetchStatus { url: String, status: u16 },
    #[error("chart request for '{url}' failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("chart document is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("audio track '{url}' could not be decoded: {reason}")]
    Decode { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("judgment windows must ascend (perfect < good < bad == miss), got {perfect}/{good}/{bad}/{miss}")]
    WindowOrder {
        perfect: f64,
        good: f64,
        bad: f64,
        miss: f64,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("ranking storage unavailable: {0}")]
    Storage(String),
    #[error("stored ranking is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}
