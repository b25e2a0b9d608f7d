//! Judgment engine: maps the playback clock and pointer clicks onto note
//! outcomes.
//!
//! The engine owns the note list for one session and is driven from two
//! places: `sweep()` once per rendered frame and `click()` for each pointer
//! event. Neither touches the DOM; side effects leave through [`JudgeEvent`]s
//! which the shell drains after each frame.

mod stats;
mod window;

pub use stats::RunStats;
pub use window::{Judgement, JudgmentWindows};

use log::debug;

use crate::chart::Note;

/// Geometry and timing parameters the engine needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeParams {
    pub windows: JudgmentWindows,
    /// Click radius around a note centre (px).
    pub hit_radius: f64,
    /// How long before its due time a note becomes drawable (ms).
    pub approach_ms: f64,
}

impl Default for JudgeParams {
    fn default() -> Self {
        Self {
            windows: JudgmentWindows::new(),
            hit_radius: 45.0,
            approach_ms: 1000.0,
        }
    }
}

/// One-way notifications for the audio/visual collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JudgeEvent {
    /// A click consumed `note`. `delta_ms` is the absolute timing error.
    Hit {
        note: usize,
        judgement: Judgement,
        delta_ms: f64,
    },
    /// The sweep consumed `note` after it left the miss window.
    Missed { note: usize },
}

/// Read-only projection of a drawable note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleNote {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    /// `time - now`; positive while the note is still approaching.
    pub dt: f64,
}

pub struct JudgeEngine {
    notes: Vec<Note>,
    params: JudgeParams,
    stats: RunStats,
    events: Vec<JudgeEvent>,
}

impl JudgeEngine {
    pub fn new(notes: Vec<Note>, params: JudgeParams) -> Self {
        let mut engine = Self {
            notes,
            params,
            stats: RunStats::new(),
            events: Vec::new(),
        };
        engine.reset();
        engine
    }

    /// Clear every processed flag and zero the totals.
    pub fn reset(&mut self) {
        for note in &mut self.notes {
            note.hit = false;
        }
        self.stats = RunStats::new();
        self.events.clear();
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Notes not yet consumed by a click or the sweep.
    pub fn remaining(&self) -> usize {
        self.notes.iter().filter(|n| !n.hit).count()
    }

    /// Lateness check: every unprocessed note more than `miss` ms overdue
    /// becomes a Miss. Returns how many notes were consumed this call.
    pub fn sweep(&mut self, now: f64) -> usize {
        let miss = self.params.windows.miss;
        let mut missed = 0;
        for (idx, note) in self.notes.iter_mut().enumerate() {
            if note.hit {
                continue;
            }
            if note.time - now < -miss {
                note.hit = true;
                self.stats.record(Judgement::Miss);
                self.events.push(JudgeEvent::Missed { note: idx });
                missed += 1;
            }
        }
        missed
    }

    /// Resolve a click at `(mx, my)` at clock time `now`.
    ///
    /// Among unprocessed notes inside both the miss window and the hit circle
    /// the one nearest in *time* wins; spatial distance only gates candidacy.
    /// A click with no candidate changes nothing and returns `None`.
    pub fn click(&mut self, mx: f64, my: f64, now: f64) -> Option<Judgement> {
        let windows = self.params.windows;
        let radius_sq = self.params.hit_radius * self.params.hit_radius;

        let mut best: Option<(usize, f64)> = None;
        for (idx, note) in self.notes.iter().enumerate() {
            if note.hit {
                continue;
            }
            let delta = (note.time - now).abs();
            if !windows.clickable(delta) {
                continue;
            }
            let dx = mx - note.x;
            let dy = my - note.y;
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            // strict: earlier authoring order keeps exact ties
            if best.is_none_or(|(_, best_delta)| delta < best_delta) {
                best = Some((idx, delta));
            }
        }

        let (idx, delta) = best?;
        self.notes[idx].hit = true;
        let judgement = windows.classify(delta);
        self.stats.record(judgement);
        self.events.push(JudgeEvent::Hit {
            note: idx,
            judgement,
            delta_ms: delta,
        });
        debug!("note {idx} judged {} ({delta:.1}ms)", judgement.label());
        Some(judgement)
    }

    /// Notes to draw at `now`: unprocessed and strictly closer than the
    /// approach duration. Call after `sweep()` so overdue notes are gone.
    pub fn visible(&self, now: f64) -> impl Iterator<Item = VisibleNote> + '_ {
        let approach = self.params.approach_ms;
        self.notes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.hit)
            .map(move |(index, n)| VisibleNote {
                index,
                x: n.x,
                y: n.y,
                dt: n.time - now,
            })
            .filter(move |v| v.dt < approach)
    }

    pub fn drain_events(&mut self) -> Vec<JudgeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(notes: &[(f64, f64, f64)]) -> JudgeEngine {
        let notes = notes.iter().map(|&(t, x, y)| Note::new(t, x, y)).collect();
        JudgeEngine::new(notes, JudgeParams::default())
    }

    #[test]
    fn tier_boundaries_on_click() {
        let eps = 1e-6;
        let cases = [
            (50.0 - eps, Some(Judgement::Perfect)),
            (50.0, Some(Judgement::Good)),
            (120.0 - eps, Some(Judgement::Good)),
            (120.0, Some(Judgement::Bad)),
            (200.0, Some(Judgement::Bad)),
            (200.0 + eps, None),
        ];
        for (delta, expected) in cases {
            let mut e = engine(&[(1000.0, 100.0, 100.0)]);
            assert_eq!(e.click(100.0, 100.0, 1000.0 + delta), expected, "late by {delta}");
            let mut e = engine(&[(1000.0, 100.0, 100.0)]);
            assert_eq!(e.click(100.0, 100.0, 1000.0 - delta), expected, "early by {delta}");
        }
    }

    #[test]
    fn nearest_in_time_wins_over_nearest_in_space() {
        // note 0 sits under the cursor but is 150ms off; note 1 is 40px away but 10ms off
        let mut e = engine(&[(1150.0, 100.0, 100.0), (1010.0, 140.0, 100.0)]);
        assert_eq!(e.click(100.0, 100.0, 1000.0), Some(Judgement::Perfect));
        assert!(!e.notes()[0].hit);
        assert!(e.notes()[1].hit);
    }

    #[test]
    fn exact_tie_keeps_authoring_order() {
        let mut e = engine(&[(1020.0, 100.0, 100.0), (980.0, 100.0, 100.0)]);
        e.click(100.0, 100.0, 1000.0);
        assert!(e.notes()[0].hit);
        assert!(!e.notes()[1].hit);
    }

    #[test]
    fn click_outside_radius_is_ignored() {
        let mut e = engine(&[(1000.0, 100.0, 100.0)]);
        assert_eq!(e.click(146.0, 100.0, 1000.0), None);
        // radius is inclusive
        assert_eq!(e.click(145.0, 100.0, 1000.0), Some(Judgement::Perfect));
    }

    #[test]
    fn empty_click_changes_nothing() {
        let mut e = engine(&[(1000.0, 100.0, 100.0)]);
        assert_eq!(e.click(500.0, 500.0, 1000.0), None);
        assert_eq!(e.stats(), &RunStats::new());
        assert!(e.notes().iter().all(|n| !n.hit));
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn one_click_consumes_at_most_one_note() {
        let mut e = engine(&[(1000.0, 100.0, 100.0), (1000.0, 100.0, 100.0)]);
        e.click(100.0, 100.0, 1000.0);
        assert_eq!(e.remaining(), 1);
        e.click(100.0, 100.0, 1000.0);
        assert_eq!(e.remaining(), 0);
        assert_eq!(e.click(100.0, 100.0, 1000.0), None);
        assert_eq!(e.stats().perfect, 2);
    }

    #[test]
    fn sweep_misses_only_past_window() {
        let mut e = engine(&[(1000.0, 100.0, 100.0)]);
        assert_eq!(e.sweep(1200.0), 0);
        assert_eq!(e.sweep(1200.001), 1);
        assert_eq!(e.stats().miss, 1);
        // processed notes are never revisited
        assert_eq!(e.sweep(5000.0), 0);
        assert_eq!(e.click(100.0, 100.0, 1200.0), None);
        assert_eq!(e.stats().miss, 1);
        assert_eq!(e.drain_events(), vec![JudgeEvent::Missed { note: 0 }]);
    }

    #[test]
    fn visibility_upper_bound_is_strict() {
        let e = engine(&[(2000.0, 10.0, 20.0)]);
        assert_eq!(e.visible(1000.0).count(), 0);
        let v: Vec<_> = e.visible(1000.001).collect();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].index, 0);
        assert_eq!((v[0].x, v[0].y), (10.0, 20.0));
    }

    #[test]
    fn hit_notes_are_not_visible() {
        let mut e = engine(&[(1000.0, 100.0, 100.0)]);
        e.click(100.0, 100.0, 990.0);
        assert_eq!(e.visible(990.0).count(), 0);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut e = engine(&[(1000.0, 100.0, 100.0)]);
        e.click(100.0, 100.0, 1000.0);
        e.reset();
        assert_eq!(e.remaining(), 1);
        assert_eq!(e.stats().score, 0);
        assert!(e.drain_events().is_empty());
    }
}
