use log::{debug, error, info, warn};
use rusqlite::named_params;
use std::collections::HashMap;

use super::database::{Database, StoreError, TransactionScope};
use crate::model::{LevelNumber, LevelRecord, StarCount, StarThresholds, MAX_STARS};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS level_times (\
       level_number INTEGER PRIMARY KEY,\
       three_star_time REAL,\
       two_star_time REAL,\
       one_star_time REAL,\
       best_finish_time REAL,\
       stars_earned INTEGER NOT NULL DEFAULT 0\
     );";

// Both writes are conditional in SQL, so the stored values can only improve.
const WRITE_BEST_TIME: &str = "INSERT INTO level_times (level_number, best_finish_time) \
     VALUES (@level, @time) \
     ON CONFLICT(level_number) DO UPDATE SET best_finish_time = excluded.best_finish_time \
     WHERE best_finish_time IS NULL OR best_finish_time > excluded.best_finish_time;";

const WRITE_STARS: &str = "INSERT INTO level_times (level_number, stars_earned) \
     VALUES (@level, @stars) \
     ON CONFLICT(level_number) DO UPDATE SET stars_earned = excluded.stars_earned \
     WHERE stars_earned < excluded.stars_earned;";

const WRITE_THRESHOLDS: &str =
    "INSERT INTO level_times (level_number, three_star_time, two_star_time, one_star_time) \
     VALUES (@level, @three, @two, @one) \
     ON CONFLICT(level_number) DO UPDATE SET three_star_time = excluded.three_star_time, \
     two_star_time = excluded.two_star_time, one_star_time = excluded.one_star_time;";

/// Typed access to the per-level table.
///
/// Store failures never reach callers: they are logged and replaced by the
/// "no data" value of each operation, so an unreachable database looks like an
/// empty one.
#[derive(Debug, Clone)]
pub struct LevelStore {
    db: Database,
}

fn or_sentinel<T>(result: Result<T, StoreError>, operation: &str, sentinel: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(target: "database", "{} failed: {}", operation, err);
            sentinel
        }
    }
}

fn clamp_stars(level: LevelNumber, stars: i64) -> StarCount {
    if !(0..=MAX_STARS as i64).contains(&stars) {
        warn!(target: "database", "Level {} has out of range star count {}", level, stars);
    }
    stars.clamp(0, MAX_STARS as i64) as StarCount
}

impl LevelStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates the level table if it does not exist yet.
    pub fn initialize(&self) -> Result<(), StoreError> {
        self.db.execute_batch(CREATE_TABLE)
    }

    pub fn read_thresholds(&self, level: LevelNumber) -> Option<StarThresholds> {
        let rows = self.db.query_rows(
            "SELECT three_star_time, two_star_time, one_star_time FROM level_times \
             WHERE level_number = @level;",
            named_params! { "@level": level },
            |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            },
        );
        match or_sentinel(rows, "read_thresholds", Vec::new()).first() {
            Some((Some(three), Some(two), Some(one))) => {
                Some(StarThresholds::new(*three, *two, *one))
            }
            _ => None,
        }
    }

    pub fn read_best_time(&self, level: LevelNumber) -> Option<f64> {
        let result = self.db.query_scalar::<f64>(
            "SELECT best_finish_time FROM level_times WHERE level_number = @level;",
            named_params! { "@level": level },
        );
        or_sentinel(result, "read_best_time", None)
    }

    /// Stores `time` when it beats the current best (or there is none).
    /// Returns whether the row changed.
    pub fn write_best_time(&self, level: LevelNumber, time: f64) -> bool {
        let result = self
            .db
            .execute(WRITE_BEST_TIME, named_params! { "@level": level, "@time": time });
        let updated = or_sentinel(result, "write_best_time", 0) > 0;
        debug!(target: "database", "write_best_time level={} time={:.2} updated={}", level, time, updated);
        updated
    }

    pub fn read_stars(&self, level: LevelNumber) -> StarCount {
        let result = self.db.query_scalar::<i64>(
            "SELECT stars_earned FROM level_times WHERE level_number = @level;",
            named_params! { "@level": level },
        );
        or_sentinel(result, "read_stars", None)
            .map(|stars| clamp_stars(level, stars))
            .unwrap_or(0)
    }

    /// Stores `stars` only when it exceeds the stored count. Returns whether the row changed.
    pub fn write_stars(&self, level: LevelNumber, stars: StarCount) -> bool {
        let result = self
            .db
            .execute(WRITE_STARS, named_params! { "@level": level, "@stars": stars });
        let updated = or_sentinel(result, "write_stars", 0) > 0;
        if updated {
            info!(target: "database", "Stars updated to {} for level {}", stars, level);
        } else {
            debug!(target: "database", "Stars {} for level {} are not an improvement", stars, level);
        }
        updated
    }

    /// Both conditional writes in one transaction. Returns `(best_updated, stars_updated)`.
    pub fn commit_finish(
        &self,
        level: LevelNumber,
        time: f64,
        stars: StarCount,
    ) -> (bool, bool) {
        let result = self.db.transaction(|tx: &TransactionScope<'_>| {
            let best_rows =
                tx.execute(WRITE_BEST_TIME, named_params! { "@level": level, "@time": time })?;
            let star_rows =
                tx.execute(WRITE_STARS, named_params! { "@level": level, "@stars": stars })?;
            Ok((best_rows > 0, star_rows > 0))
        });
        let outcome = or_sentinel(result, "commit_finish", (false, false));
        debug!(
            target: "database",
            "commit_finish level={} time={:.2} stars={} -> {:?}", level, time, stars, outcome
        );
        outcome
    }

    pub fn read_all_stars(&self) -> HashMap<LevelNumber, StarCount> {
        let rows = self.db.query_rows(
            "SELECT level_number, stars_earned FROM level_times;",
            &[],
            |row| Ok((row.get::<_, LevelNumber>(0)?, row.get::<_, i64>(1)?)),
        );
        or_sentinel(rows, "read_all_stars", Vec::new())
            .into_iter()
            .map(|(level, stars)| (level, clamp_stars(level, stars)))
            .collect()
    }

    pub fn read_all_records(&self) -> Vec<LevelRecord> {
        let rows = self.db.query_rows(
            "SELECT level_number, three_star_time, two_star_time, one_star_time, \
             best_finish_time, stars_earned FROM level_times ORDER BY level_number ASC;",
            &[],
            |row| {
                let level_number: LevelNumber = row.get(0)?;
                let thresholds = match (
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ) {
                    (Some(three), Some(two), Some(one)) => {
                        Some(StarThresholds::new(three, two, one))
                    }
                    _ => None,
                };
                Ok(LevelRecord {
                    level_number,
                    thresholds,
                    best_finish_time: row.get(4)?,
                    stars_earned: clamp_stars(level_number, row.get(5)?),
                })
            },
        );
        or_sentinel(rows, "read_all_records", Vec::new())
    }

    pub fn write_thresholds(&self, level: LevelNumber, thresholds: &StarThresholds) -> bool {
        for warning in thresholds.warnings() {
            warn!(target: "database", "Level {}: {}", level, warning);
        }
        let result = self.db.execute(
            WRITE_THRESHOLDS,
            named_params! {
                "@level": level,
                "@three": thresholds.three_star,
                "@two": thresholds.two_star,
                "@one": thresholds.one_star,
            },
        );
        or_sentinel(result, "write_thresholds", 0) > 0
    }
}
