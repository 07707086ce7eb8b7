use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::TimestampSeconds;
use uuid::Uuid;

use super::{LevelNumber, StarCount};

/// Transitions announced by a running level session. Each is delivered once,
/// at the moment it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    Finished { time: f64 },
    Died,
}

/// Result of handling a level finish.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishOutcome {
    pub session_id: Uuid,
    pub level: LevelNumber,
    pub finish_time: f64,
    pub previous_best: Option<f64>,
    pub new_best: bool,
    /// Stars this run is worth on its own, whether or not it was a new best.
    pub run_stars: StarCount,
    /// Stars held by the level after the finish was processed.
    pub stored_stars: StarCount,
    #[serde_as(as = "TimestampSeconds")]
    pub finished_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    FinishRecorded(FinishOutcome),
    FinishRejected { level: LevelNumber, time: f64 },
}
