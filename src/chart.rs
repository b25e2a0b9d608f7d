//! Chart documents: timed, positioned notes paired with an audio track.
//!
//! Charts are authored by hand or exported from the recorder and fetched as
//! JSON. Field access is the only validation performed; a document missing
//! `audio` or `notes` fails to parse.

use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// Charts offered in the selection menu: (display name, document URL).
pub const BUILTIN_CHARTS: &[(&str, &str)] = &[
    ("Xenosphere", "charts/song1.json"),
    ("Demo Song 2", "charts/song2.json"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub name: String,
    pub file: String,
}

pub fn builtin_catalog() -> Vec<ChartEntry> {
    BUILTIN_CHARTS
        .iter()
        .map(|(name, file)| ChartEntry {
            name: (*name).to_string(),
            file: (*file).to_string(),
        })
        .collect()
}

/// A single target. `time` is chart-relative milliseconds; `x`/`y` are canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    /// Processed flag: set once by a consuming click or by the miss sweep.
    #[serde(skip)]
    pub hit: bool,
}

impl Note {
    pub fn new(time: f64, x: f64, y: f64) -> Self {
        Self {
            time,
            x,
            y,
            hit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub audio: String,
    /// Authoring order; not necessarily sorted by time.
    pub notes: Vec<Note>,
}

impl Chart {
    pub fn new(audio: impl Into<String>, notes: Vec<Note>) -> Self {
        Self {
            title: None,
            audio: audio.into(),
            notes,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ChartError> {
        let mut chart: Chart = serde_json::from_str(text)?;
        chart.reset_hits();
        Ok(chart)
    }

    pub fn to_json_pretty(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn reset_hits(&mut self) {
        for note in &mut self.notes {
            note.hit = false;
        }
    }

    /// Due time of the latest note, if any.
    pub fn last_note_time(&self) -> Option<f64> {
        self.notes.iter().map(|n| n.time).reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_and_clears_hit_flags() {
        let text = r#"{
            "audio": "charts/song1.mp3",
            "notes": [
                { "time": 1000, "x": 100, "y": 100 },
                { "time": 500.5, "x": 320, "y": 240 }
            ]
        }"#;
        let chart = Chart::from_json(text).unwrap();
        assert_eq!(chart.audio, "charts/song1.mp3");
        assert_eq!(chart.notes.len(), 2);
        // authoring order is preserved
        assert_eq!(chart.notes[1].time, 500.5);
        assert!(chart.notes.iter().all(|n| !n.hit));
        assert_eq!(chart.last_note_time(), Some(1000.0));
    }

    #[test]
    fn tolerates_title_and_unknown_fields() {
        let text = r#"{ "title": "t", "audio": "a.mp3", "bpm": 120, "notes": [] }"#;
        let chart = Chart::from_json(text).unwrap();
        assert_eq!(chart.title.as_deref(), Some("t"));
        assert!(chart.notes.is_empty());
        assert_eq!(chart.last_note_time(), None);
    }

    #[test]
    fn missing_notes_is_a_parse_error() {
        let err = Chart::from_json(r#"{ "audio": "a.mp3" }"#).unwrap_err();
        assert!(matches!(err, ChartError::Parse(_)));
    }

    #[test]
    fn hit_flag_is_not_serialized() {
        let mut chart = Chart::new("a.mp3", vec![Note::new(10.0, 1.0, 2.0)]);
        chart.notes[0].hit = true;
        let json = chart.to_json_pretty().unwrap();
        assert!(!json.contains("hit"));
        assert!(!json.contains("title"));
    }

    #[test]
    fn builtin_catalog_matches_table() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), BUILTIN_CHARTS.len());
        assert_eq!(catalog[0].name, "Xenosphere");
        assert_eq!(catalog[0].file, "charts/song1.json");
    }
}
