use log::info;

use super::database::{Database, StoreError};
use super::level_store::LevelStore;
use super::run_stats::{RunStatsTable, SharedRunStats};
use super::settings::Settings;

/// Application-wide collaborators, built once at startup and lent to each
/// level session.
pub struct GameContext {
    pub settings: Settings,
    pub store: LevelStore,
    pub run_stats: SharedRunStats,
}

impl GameContext {
    pub fn new(settings: Settings) -> Self {
        let store = LevelStore::new(Database::new(&settings.database_path));
        Self {
            settings,
            store,
            run_stats: RunStatsTable::shared(),
        }
    }

    /// Like [`GameContext::new`], also creating the level table when missing.
    pub fn open(settings: Settings) -> Result<Self, StoreError> {
        let context = Self::new(settings);
        context.store.initialize()?;
        info!(
            target: "database",
            "Using star database at {}",
            context.settings.database_path.display()
        );
        Ok(context)
    }
}
