use chrono::Utc;
use itertools::Itertools;
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::model::{LevelNumber, RunStatistics};

/// Per-level run statistics for the lifetime of the process. Owned by the
/// application context and lent to the components that record into it.
#[derive(Debug, Default)]
pub struct RunStatsTable {
    levels: HashMap<LevelNumber, RunStatistics>,
}

pub type SharedRunStats = Rc<RefCell<RunStatsTable>>;

impl RunStatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRunStats {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn record(&mut self, level: LevelNumber, time: f64) -> bool {
        self.record_at(level, time, Utc::now().timestamp())
    }

    /// Negative or non-finite times are skipped; returns whether the run was kept.
    pub fn record_at(&mut self, level: LevelNumber, time: f64, recorded_at: i64) -> bool {
        if !time.is_finite() || time < 0.0 {
            warn!(target: "timer", "Invalid run time {} for level {}; run not recorded", time, level);
            return false;
        }
        let stats = self
            .levels
            .entry(level)
            .and_modify(|stats| stats.record(time, recorded_at))
            .or_insert_with(|| RunStatistics::first_run(time, recorded_at));
        debug!(
            target: "timer",
            "Level {} runs={} fastest={:.2} average={:.2}",
            level,
            stats.runs,
            stats.fastest,
            stats.average()
        );
        true
    }

    pub fn get(&self, level: LevelNumber) -> Option<&RunStatistics> {
        self.levels.get(&level)
    }

    /// Levels with at least one run, in ascending order.
    pub fn levels(&self) -> Vec<LevelNumber> {
        self.levels.keys().copied().sorted().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_record_creates_entry() {
        let mut table = RunStatsTable::new();
        assert!(table.get(1).is_none());

        table.record_at(1, 14.0, 10);
        let stats = table.get(1).unwrap();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.fastest, 14.0);
        assert_eq!(stats.slowest, 14.0);
    }

    #[test]
    fn test_levels_are_independent_and_sorted() {
        let mut table = RunStatsTable::new();
        table.record_at(3, 20.0, 1);
        table.record_at(1, 10.0, 2);
        table.record_at(3, 18.0, 3);

        assert_eq!(table.levels(), vec![1, 3]);
        assert_eq!(table.get(1).unwrap().runs, 1);
        assert_eq!(table.get(3).unwrap().runs, 2);
        assert_eq!(table.get(3).unwrap().fastest, 18.0);
    }

    #[test]
    fn test_invalid_times_are_skipped() {
        let mut table = RunStatsTable::new();
        assert!(!table.record_at(1, -1.0, 1));
        assert!(!table.record_at(1, f64::NAN, 2));
        assert!(!table.record_at(1, f64::INFINITY, 3));
        assert!(table.is_empty());

        assert!(table.record_at(1, 10.0, 4));
        assert!(!table.record_at(1, -5.0, 5));
        let stats = table.get(1).unwrap();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.fastest, 10.0);
        assert_eq!(stats.last_recorded_at, 4);
    }
}
