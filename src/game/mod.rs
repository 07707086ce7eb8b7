pub mod context;
pub mod database;
pub mod level_session;
pub mod level_store;
pub mod level_timer;
pub mod run_stats;
pub mod settings;
pub mod star_calculator;
pub mod star_tracker;
pub mod threshold_tuner;

pub use context::GameContext;
pub use database::{Database, StoreError};
pub use level_session::LevelSession;
pub use level_store::LevelStore;
pub use level_timer::{LevelTimer, TimerRunState};
pub use run_stats::{RunStatsTable, SharedRunStats};
pub use star_calculator::{suggest_thresholds, StarCalculator};
pub use star_tracker::StarTracker;
pub use threshold_tuner::{ThresholdTuner, TunerRow};
