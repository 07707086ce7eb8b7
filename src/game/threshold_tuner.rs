use log::{info, warn};

use super::level_store::LevelStore;
use super::run_stats::RunStatsTable;
use super::star_calculator::suggest_thresholds;
use crate::model::{LevelNumber, StarMultipliers, StarThresholds, ThresholdSuggestion};

#[derive(Debug, Clone, PartialEq)]
pub struct TunerRow {
    pub level: LevelNumber,
    pub thresholds: StarThresholds,
}

/// Editor-side bulk editing of star thresholds. Rows are loaded once, edited
/// in memory, and written back together by [`ThresholdTuner::save`].
pub struct ThresholdTuner<'a> {
    store: &'a LevelStore,
    rows: Vec<TunerRow>,
}

impl<'a> ThresholdTuner<'a> {
    /// Levels without a complete set of thresholds are skipped.
    pub fn load(store: &'a LevelStore) -> Self {
        let rows: Vec<TunerRow> = store
            .read_all_records()
            .into_iter()
            .filter_map(|record| {
                record.thresholds.map(|thresholds| TunerRow {
                    level: record.level_number,
                    thresholds,
                })
            })
            .collect();
        info!(target: "tuner", "Loaded {} level thresholds", rows.len());
        Self { store, rows }
    }

    pub fn rows(&self) -> &[TunerRow] {
        &self.rows
    }

    pub fn row(&self, level: LevelNumber) -> Option<&TunerRow> {
        self.rows.iter().find(|row| row.level == level)
    }

    /// Replaces the thresholds of `level`, adding a row when the level has none yet.
    pub fn set_thresholds(&mut self, level: LevelNumber, thresholds: StarThresholds) {
        match self.rows.iter_mut().find(|row| row.level == level) {
            Some(row) => row.thresholds = thresholds,
            None => {
                self.rows.push(TunerRow { level, thresholds });
                self.rows.sort_by_key(|row| row.level);
            }
        }
    }

    pub fn suggestion(
        &self,
        level: LevelNumber,
        run_stats: &RunStatsTable,
        multipliers: &StarMultipliers,
    ) -> Option<ThresholdSuggestion> {
        run_stats
            .get(level)
            .map(|stats| suggest_thresholds(stats, multipliers))
    }

    /// Copies the suggestion into the row. Returns false when there are no
    /// usable runs for the level.
    pub fn apply_suggestion(
        &mut self,
        level: LevelNumber,
        run_stats: &RunStatsTable,
        multipliers: &StarMultipliers,
    ) -> bool {
        match self.suggestion(level, run_stats, multipliers) {
            Some(suggestion) if suggestion.is_valid() => {
                self.set_thresholds(level, suggestion.as_thresholds());
                true
            }
            _ => false,
        }
    }

    pub fn warnings(&self) -> Vec<(LevelNumber, &'static str)> {
        self.rows
            .iter()
            .flat_map(|row| {
                row.thresholds
                    .warnings()
                    .into_iter()
                    .map(move |warning| (row.level, warning))
            })
            .collect()
    }

    /// Writes every row back. Returns how many were stored.
    pub fn save(&self) -> usize {
        let saved = self
            .rows
            .iter()
            .filter(|row| self.store.write_thresholds(row.level, &row.thresholds))
            .count();
        if saved < self.rows.len() {
            warn!(target: "tuner", "Saved {} of {} level thresholds", saved, self.rows.len());
        } else {
            info!(target: "tuner", "Thresholds saved to database");
        }
        saved
    }
}
