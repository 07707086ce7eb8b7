use log::trace;

use super::level_store::LevelStore;
use crate::model::{
    LevelNumber, RunStatistics, StarCount, StarMultipliers, ThresholdSuggestion,
};

/// Rates finish times against the thresholds stored for a level.
pub struct StarCalculator<'a> {
    store: &'a LevelStore,
}

impl<'a> StarCalculator<'a> {
    pub fn new(store: &'a LevelStore) -> Self {
        Self { store }
    }

    /// 0 when the level has no thresholds.
    pub fn calculate_stars(&self, level: LevelNumber, finish_time: f64) -> StarCount {
        let stars = self
            .store
            .read_thresholds(level)
            .map(|thresholds| thresholds.stars_for(finish_time))
            .unwrap_or(0);
        trace!(target: "stars", "Level {} finish {:.2} rates {} stars", level, finish_time, stars);
        stars
    }
}

/// Thresholds scaled from the fastest recorded run. Zeroed until a run with a
/// positive time exists.
pub fn suggest_thresholds(
    stats: &RunStatistics,
    multipliers: &StarMultipliers,
) -> ThresholdSuggestion {
    if stats.fastest <= 0.0 {
        return ThresholdSuggestion::default();
    }
    ThresholdSuggestion {
        three_star: stats.fastest * multipliers.three_star,
        two_star: stats.fastest * multipliers.two_star,
        one_star: stats.fastest * multipliers.one_star,
    }
}
