//! Timing thresholds and the judgement tiers they map onto.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ascending millisecond thresholds. `bad` and `miss` must coincide:
/// anything clickable that is not Perfect or Good is Bad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgmentWindows {
    pub perfect: f64,
    pub good: f64,
    pub bad: f64,
    pub miss: f64,
}

impl JudgmentWindows {
    pub const fn new() -> Self {
        Self {
            perfect: 50.0,
            good: 120.0,
            bad: 200.0,
            miss: 200.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.perfect > 0.0
            && self.perfect < self.good
            && self.good < self.bad
            && self.bad == self.miss;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::WindowOrder {
                perfect: self.perfect,
                good: self.good,
                bad: self.bad,
                miss: self.miss,
            })
        }
    }

    /// Tier for an absolute delta already known to be within `miss`.
    /// Tier bounds are open: a delta equal to `perfect` is Good.
    pub fn classify(&self, abs_delta_ms: f64) -> Judgement {
        if abs_delta_ms < self.perfect {
            Judgement::Perfect
        } else if abs_delta_ms < self.good {
            Judgement::Good
        } else {
            Judgement::Bad
        }
    }

    /// Whether a note this far from the clock may still be clicked (inclusive).
    pub fn clickable(&self, abs_delta_ms: f64) -> bool {
        abs_delta_ms <= self.miss
    }
}

impl Default for JudgmentWindows {
    fn default() -> Self {
        Self::new()
    }
}

/// Judgement tiers from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgement {
    Perfect,
    Good,
    Bad,
    /// Note passed the miss window without a click.
    Miss,
}

impl Judgement {
    pub fn points(self) -> u64 {
        match self {
            Judgement::Perfect => 300,
            Judgement::Good => 100,
            Judgement::Bad => 50,
            Judgement::Miss => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Judgement::Perfect => "Perfect",
            Judgement::Good => "Good",
            Judgement::Bad => "Bad",
            Judgement::Miss => "Miss",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_windows_are_valid() {
        assert!(JudgmentWindows::new().validate().is_ok());
    }

    #[test]
    fn rejects_unordered_windows() {
        let w = JudgmentWindows {
            perfect: 130.0,
            good: 120.0,
            bad: 200.0,
            miss: 200.0,
        };
        assert!(matches!(w.validate(), Err(ConfigError::WindowOrder { .. })));
    }

    #[test]
    fn rejects_bad_window_narrower_than_miss() {
        let w = JudgmentWindows {
            bad: 150.0,
            ..JudgmentWindows::new()
        };
        assert!(matches!(w.validate(), Err(ConfigError::WindowOrder { .. })));
    }

    #[test]
    fn tier_bounds_are_open() {
        let w = JudgmentWindows::new();
        assert_eq!(w.classify(49.999), Judgement::Perfect);
        assert_eq!(w.classify(50.0), Judgement::Good);
        assert_eq!(w.classify(119.999), Judgement::Good);
        assert_eq!(w.classify(120.0), Judgement::Bad);
        assert_eq!(w.classify(200.0), Judgement::Bad);
    }

    #[test]
    fn miss_window_is_inclusive() {
        let w = JudgmentWindows::new();
        assert!(w.clickable(200.0));
        assert!(!w.clickable(200.001));
    }
}
