use serde::{Deserialize, Serialize};

use super::{LevelNumber, StarCount, StarThresholds};

/// One row of the level table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub level_number: LevelNumber,
    pub thresholds: Option<StarThresholds>,
    pub best_finish_time: Option<f64>,
    pub stars_earned: StarCount,
}
