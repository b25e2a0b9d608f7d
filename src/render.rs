//! Pure draw-list projection for the play field and HUD text.
//! The canvas shell turns these into draw calls.

use crate::judge::{RunStats, VisibleNote};
use crate::ranking::Ranking;
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachCircle {
    pub x: f64,
    pub y: f64,
    /// Shrinks from `max_radius` to `target_radius` as the note comes due.
    pub radius: f64,
    pub target_radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub hit_radius: f64,
    pub max_radius: f64,
    pub approach_ms: f64,
}

impl Layout {
    pub fn circle(&self, note: &VisibleNote) -> ApproachCircle {
        // late notes stay at the target size until the sweep takes them
        let t = note.dt.max(0.0);
        let radius =
            self.hit_radius + (t / self.approach_ms) * (self.max_radius - self.hit_radius);
        ApproachCircle {
            x: note.x,
            y: note.y,
            radius,
            target_radius: self.hit_radius,
        }
    }

    pub fn circles(&self, notes: &[VisibleNote]) -> Vec<ApproachCircle> {
        notes.iter().map(|n| self.circle(n)).collect()
    }
}

/// Which page overlays are shown in each session state. The menu stays
/// hidden while a result is up so a new chart can only start after Back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlays {
    pub menu: bool,
    pub result: bool,
}

impl Overlays {
    pub fn for_state(state: SessionState) -> Self {
        match state {
            SessionState::Idle | SessionState::Loading => Self { menu: true, result: false },
            SessionState::Playing => Self { menu: false, result: false },
            SessionState::Ended => Self { menu: false, result: true },
        }
    }
}

pub fn score_text(stats: &RunStats) -> String {
    format!("Score: {}", stats.score)
}

pub fn judge_text(stats: &RunStats) -> String {
    let label = stats.last_judgement.map(|j| j.label()).unwrap_or("-");
    format!("Judge: {label}")
}

pub fn tally_text(stats: &RunStats) -> String {
    format!(
        "Perfect: {} / Good: {} / Bad: {} / Miss: {}",
        stats.perfect, stats.good, stats.bad, stats.miss
    )
}

/// Ranking lines, `"1. 1500"` style.
pub fn ranking_lines(ranking: &Ranking) -> Vec<String> {
    ranking
        .scores()
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect()
}
