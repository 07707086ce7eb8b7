mod level_event;
mod level_record;
mod run_statistics;
mod star_thresholds;
mod threshold_suggestion;

pub use level_event::{FinishOutcome, LevelEvent, TrackerEvent};
pub use level_record::LevelRecord;
pub use run_statistics::RunStatistics;
pub use star_thresholds::StarThresholds;
pub use threshold_suggestion::{StarMultipliers, ThresholdSuggestion};

/// Levels are numbered from 1.
pub type LevelNumber = u32;
pub type StarCount = u8;

pub const MAX_STARS: StarCount = 3;
