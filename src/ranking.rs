//! Top-N score ranking with pluggable key-value persistence.
//!
//! The persisted form is a JSON array of at most `capacity` numbers in
//! descending order. The browser backs it with `localStorage`; tests and
//! hosts without storage use [`MemoryStore`].

use std::cell::RefCell;
use std::collections::HashMap;

use log::warn;

use crate::error::RankingError;

pub const MAX_ENTRIES: usize = 5;

/// Minimal durable string slot store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, RankingError>;
    fn set(&self, key: &str, value: &str) -> Result<(), RankingError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, RankingError> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RankingError> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    scores: Vec<u64>,
    capacity: usize,
}

impl Ranking {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Build from arbitrary scores, restoring order and bound.
    pub fn from_scores(scores: impl IntoIterator<Item = u64>, capacity: usize) -> Self {
        let mut ranking = Self::new(capacity);
        ranking.scores.extend(scores);
        ranking.normalize();
        ranking
    }

    pub fn push(&mut self, score: u64) {
        self.scores.push(score);
        self.normalize();
    }

    pub fn scores(&self) -> &[u64] {
        &self.scores
    }

    pub fn best(&self) -> Option<u64> {
        self.scores.first().copied()
    }

    fn normalize(&mut self) {
        self.scores.sort_unstable_by(|a, b| b.cmp(a));
        self.scores.truncate(self.capacity);
    }

    pub fn load(store: &dyn KeyValueStore, key: &str, capacity: usize) -> Result<Self, RankingError> {
        let Some(text) = store.get(key)? else {
            return Ok(Self::new(capacity));
        };
        let raw: Vec<f64> = serde_json::from_str(&text)?;
        // scores are whole points; drop anything a hand-edited slot might carry
        let scores = raw
            .into_iter()
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(|s| s as u64);
        Ok(Self::from_scores(scores, capacity))
    }

    /// Load, falling back to an empty ranking when the slot is unreadable.
    pub fn load_or_default(store: &dyn KeyValueStore, key: &str, capacity: usize) -> Self {
        Self::load(store, key, capacity).unwrap_or_else(|e| {
            warn!("discarding stored ranking: {e}");
            Self::new(capacity)
        })
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), RankingError> {
        let text = serde_json::to_string(&self.scores)?;
        store.set(key, &text)
    }
}
