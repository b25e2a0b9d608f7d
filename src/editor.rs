//! Tap-along chart recorder.
//!
//! While the reference track plays, every click is appended as a note at
//! the current audio position. Nothing is deduplicated, quantized or checked
//! for playability.

use crate::chart::{Chart, Note};
use crate::error::ChartError;

pub const EXPORT_TITLE: &str = "Untitled chart";
pub const EXPORT_AUDIO: &str = "charts/your_track.mp3";

#[derive(Debug, Default)]
pub struct Recorder {
    playing: bool,
    notes: Vec<Note>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Flip play/pause and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Record a tap; ignored while paused.
    pub fn record(&mut self, time_ms: f64, x: f64, y: f64) -> bool {
        if !self.playing {
            return false;
        }
        self.notes.push(Note::new(time_ms, x, y));
        true
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Chart with placeholder title/audio the author edits by hand.
    pub fn export(&self) -> Chart {
        Chart {
            title: Some(EXPORT_TITLE.to_string()),
            audio: EXPORT_AUDIO.to_string(),
            notes: self.notes.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String, ChartError> {
        self.export().to_json_pretty()
    }

    /// One line per note, numbered from 1, values rounded for display.
    pub fn listing(&self) -> String {
        self.notes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                format!(
                    "{}: time={:.0}ms, x={:.0}, y={:.0}",
                    i + 1,
                    n.time,
                    n.x,
                    n.y
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
