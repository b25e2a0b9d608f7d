//! Session controller: `Idle → Loading → Playing → Ended → Idle`.
//!
//! The controller owns the judgment engine for the current chart, queues
//! pointer clicks until the next frame and hands the final totals to the
//! ranking when the player dismisses the result screen. It never samples a
//! clock itself; callers pass the playback time in.

use log::{debug, error, info, warn};

use crate::chart::Chart;
use crate::error::{ChartError, SessionError};
use crate::judge::{JudgeEngine, JudgeEvent, JudgeParams, RunStats, VisibleNote};
use crate::ranking::{KeyValueStore, Ranking};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Playing,
    Ended,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Playing => "playing",
            SessionState::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingClick {
    x: f64,
    y: f64,
    at_ms: f64,
}

pub struct Session {
    state: SessionState,
    params: JudgeParams,
    engine: Option<JudgeEngine>,
    pending: Vec<PendingClick>,
    result: Option<RunStats>,
    ranking: Ranking,
    store: Box<dyn KeyValueStore>,
    ranking_key: String,
}

impl Session {
    pub fn new(
        params: JudgeParams,
        store: Box<dyn KeyValueStore>,
        ranking_key: impl Into<String>,
        ranking_len: usize,
    ) -> Self {
        let ranking_key = ranking_key.into();
        let ranking = Ranking::load_or_default(store.as_ref(), &ranking_key, ranking_len);
        Self {
            state: SessionState::Idle,
            params,
            engine: None,
            pending: Vec::new(),
            result: None,
            ranking,
            store,
            ranking_key,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    /// Final totals while the result screen is up.
    pub fn result(&self) -> Option<&RunStats> {
        self.result.as_ref()
    }

    /// Live totals; zeroed outside a loaded session.
    pub fn stats(&self) -> RunStats {
        self.engine
            .as_ref()
            .map(|e| e.stats().clone())
            .unwrap_or_default()
    }

    fn expect(&self, want: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == want {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    fn transition(&mut self, to: SessionState) {
        debug!("session {} -> {}", self.state.name(), to.name());
        self.state = to;
    }

    /// A chart was chosen and start confirmed.
    pub fn begin_loading(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::Idle, "start loading")?;
        self.engine = None;
        self.pending.clear();
        self.result = None;
        self.transition(SessionState::Loading);
        Ok(())
    }

    /// Chart parsed and playback started; the caller anchors its clock now.
    pub fn start_playing(&mut self, chart: Chart) -> Result<(), SessionError> {
        self.expect(SessionState::Loading, "start playing")?;
        info!(
            "playing '{}' with {} notes",
            chart.title.as_deref().unwrap_or(&chart.audio),
            chart.notes.len()
        );
        self.engine = Some(JudgeEngine::new(chart.notes, self.params));
        self.transition(SessionState::Playing);
        Ok(())
    }

    /// Fetch, parse or decode failed. The attempt is over; nothing is retried.
    pub fn abort_loading(&mut self, cause: &ChartError) -> Result<(), SessionError> {
        self.expect(SessionState::Loading, "abort loading")?;
        error!("chart load failed: {cause}");
        self.engine = None;
        self.transition(SessionState::Idle);
        Ok(())
    }

    /// Queue a click for the next frame. Ignored unless playing.
    pub fn queue_click(&mut self, x: f64, y: f64, at_ms: f64) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.pending.push(PendingClick { x, y, at_ms });
        true
    }

    fn resolve_pending(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            self.pending.clear();
            return;
        };
        for click in self.pending.drain(..) {
            engine.click(click.x, click.y, click.at_ms);
        }
    }

    /// One render tick: queued clicks first, then the lateness sweep, so a
    /// click landing exactly on the miss boundary still counts.
    pub fn frame(&mut self, now: f64) -> Vec<JudgeEvent> {
        if self.state != SessionState::Playing {
            return Vec::new();
        }
        self.resolve_pending();
        match self.engine.as_mut() {
            Some(engine) => {
                engine.sweep(now);
                engine.drain_events()
            }
            None => Vec::new(),
        }
    }

    pub fn visible(&self, now: f64) -> Vec<VisibleNote> {
        match (&self.engine, self.state) {
            (Some(engine), SessionState::Playing) => engine.visible(now).collect(),
            _ => Vec::new(),
        }
    }

    /// Audio reported completion. Pending clicks are resolved and one last
    /// sweep runs at `now`; notes whose window is still open stay unjudged.
    pub fn finish(&mut self, now: f64) -> Result<&RunStats, SessionError> {
        self.expect(SessionState::Playing, "finish")?;
        self.resolve_pending();
        let stats = match self.engine.as_mut() {
            Some(engine) => {
                engine.sweep(now);
                engine.drain_events();
                engine.stats().clone()
            }
            None => RunStats::new(),
        };
        info!(
            "session ended: score {} ({}/{}/{}/{})",
            stats.score, stats.perfect, stats.good, stats.bad, stats.miss
        );
        self.transition(SessionState::Ended);
        Ok(&*self.result.insert(stats))
    }

    /// Result screen dismissed: record the score and return to the menu.
    pub fn acknowledge(&mut self) -> Result<&Ranking, SessionError> {
        self.expect(SessionState::Ended, "acknowledge result")?;
        if let Some(result) = self.result.take() {
            self.ranking.push(result.score);
            if let Err(e) = self.ranking.save(self.store.as_ref(), &self.ranking_key) {
                warn!("ranking not persisted: {e}");
            }
        }
        self.engine = None;
        self.pending.clear();
        self.transition(SessionState::Idle);
        Ok(&self.ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Note;
    use crate::judge::Judgement;
    use crate::ranking::{MAX_ENTRIES, MemoryStore};

    fn session() -> Session {
        Session::new(
            JudgeParams::default(),
            Box::new(MemoryStore::new()),
            "ranking",
            MAX_ENTRIES,
        )
    }

    fn one_note_chart() -> Chart {
        Chart::new("a.mp3", vec![Note::new(1000.0, 100.0, 100.0)])
    }

    #[test]
    fn full_cycle_with_perfect_hit() {
        let mut s = session();
        s.begin_loading().unwrap();
        s.start_playing(one_note_chart()).unwrap();
        assert!(s.queue_click(100.0, 100.0, 1010.0));
        let events = s.frame(1016.0);
        assert!(matches!(
            events.as_slice(),
            [JudgeEvent::Hit { judgement: Judgement::Perfect, .. }]
        ));
        let result = s.finish(3000.0).unwrap().clone();
        assert_eq!(result.counts(), (1, 0, 0, 0));
        assert_eq!(result.score, 300);
        assert_eq!(s.acknowledge().unwrap().scores(), &[300]);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn click_on_miss_boundary_beats_same_frame_sweep() {
        let mut s = session();
        s.begin_loading().unwrap();
        s.start_playing(one_note_chart()).unwrap();
        s.queue_click(100.0, 100.0, 1200.0);
        s.frame(1250.0);
        assert_eq!(s.stats().counts(), (0, 0, 1, 0));
    }

    #[test]
    fn finish_leaves_unreached_notes_unjudged() {
        let mut s = session();
        s.begin_loading().unwrap();
        let chart = Chart::new(
            "a.mp3",
            vec![Note::new(1000.0, 0.0, 0.0), Note::new(9000.0, 0.0, 0.0)],
        );
        s.start_playing(chart).unwrap();
        s.frame(1500.0);
        assert_eq!(s.stats().miss, 1);
        let result = s.finish(2000.0).unwrap();
        assert_eq!(result.counts(), (0, 0, 0, 1));
    }

    #[test]
    fn finish_spares_note_still_inside_its_window() {
        let mut s = session();
        s.begin_loading().unwrap();
        let chart = Chart::new(
            "a.mp3",
            vec![Note::new(2900.0, 0.0, 0.0), Note::new(5000.0, 0.0, 0.0)],
        );
        s.start_playing(chart).unwrap();
        s.frame(3000.0);
        let result = s.finish(3000.0).unwrap();
        assert_eq!(result.counts(), (0, 0, 0, 0));
        assert_eq!(result.score, 0);
    }

    #[test]
    fn finish_sweeps_notes_already_late() {
        let mut s = session();
        s.begin_loading().unwrap();
        s.start_playing(one_note_chart()).unwrap();
        // no frame ran after the window closed
        let result = s.finish(1200.5).unwrap();
        assert_eq!(result.counts(), (0, 0, 0, 1));
    }

    #[test]
    fn clicks_outside_playing_are_ignored() {
        let mut s = session();
        assert!(!s.queue_click(0.0, 0.0, 0.0));
        s.begin_loading().unwrap();
        assert!(!s.queue_click(0.0, 0.0, 0.0));
        assert!(s.frame(0.0).is_empty());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut s = session();
        assert_eq!(
            s.finish(0.0).unwrap_err(),
            SessionError::InvalidTransition {
                action: "finish",
                state: "idle"
            }
        );
        assert!(s.acknowledge().is_err());
        s.begin_loading().unwrap();
        assert!(s.begin_loading().is_err());
    }

    #[test]
    fn load_failure_returns_to_idle() {
        let mut s = session();
        s.begin_loading().unwrap();
        let cause = ChartError::FetchStatus {
            url: "charts/x.json".into(),
            status: 404,
        };
        s.abort_loading(&cause).unwrap();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.ranking().scores().is_empty());
    }

    #[test]
    fn begin_loading_clears_previous_result() {
        let mut s = session();
        s.begin_loading().unwrap();
        s.start_playing(one_note_chart()).unwrap();
        s.finish(5000.0).unwrap();
        assert!(s.result().is_some());
        s.acknowledge().unwrap();
        s.begin_loading().unwrap();
        assert!(s.result().is_none());
        assert_eq!(s.stats(), RunStats::new());
    }
}
