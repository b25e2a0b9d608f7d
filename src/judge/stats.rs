//! Run totals accumulated during a single play session.

use super::window::Judgement;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub perfect: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
    pub score: u64,
    /// Most recent click judgement, shown by the HUD. Misses do not replace it.
    pub last_judgement: Option<Judgement>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, judgement: Judgement) {
        match judgement {
            Judgement::Perfect => self.perfect += 1,
            Judgement::Good => self.good += 1,
            Judgement::Bad => self.bad += 1,
            Judgement::Miss => {
                self.miss += 1;
                return;
            }
        }
        self.score += judgement.points();
        self.last_judgement = Some(judgement);
    }

    pub fn total_judged(&self) -> u32 {
        self.perfect + self.good + self.bad + self.miss
    }

    /// Weighted accuracy percentage (0-100), scaled against all-Perfect.
    pub fn accuracy(&self) -> f64 {
        let total = self.total_judged();
        if total == 0 {
            return 0.0;
        }
        let max = total as f64 * Judgement::Perfect.points() as f64;
        self.score as f64 / max * 100.0
    }

    /// `(perfect, good, bad, miss)` for compact comparisons.
    pub fn counts(&self) -> (u32, u32, u32, u32) {
        (self.perfect, self.good, self.bad, self.miss)
    }
}
