use crate::model::{LevelNumber, StarMultipliers};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;

const APP_DIR: &str = "levelstars";
const DATABASE_ENV: &str = "LEVELSTARS_DB";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_first_level")]
    pub first_level: LevelNumber,

    #[serde(default = "default_last_level")]
    pub last_level: LevelNumber,

    #[serde(default)]
    pub multipliers: StarMultipliers,

    /// Persist best time and stars in one transaction.
    #[serde(default = "default_true")]
    pub atomic_finish_writes: bool,
}

// Helper functions for default values
fn default_version() -> u32 {
    2
}
fn default_database_path() -> PathBuf {
    PathBuf::from("StarsDatabase.db")
}
fn default_first_level() -> LevelNumber {
    1
}
fn default_last_level() -> LevelNumber {
    12
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: default_version(),
            database_path: default_database_path(),
            first_level: default_first_level(),
            last_level: default_last_level(),
            multipliers: StarMultipliers::default(),
            atomic_finish_writes: true,
        }
    }
}

impl Settings {
    /// Loads settings from the user data dir, writing defaults when none exist.
    /// `LEVELSTARS_DB` overrides the database path.
    pub fn load() -> Self {
        let mut settings = match Self::settings_path().map(fs::read_to_string) {
            Some(Ok(contents)) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(target: "settings", "Ignoring unreadable settings file: {}", err);
                Settings::default()
            }),
            _ => {
                let default = Settings::default();
                if let Err(err) = default.save() {
                    warn!(target: "settings", "Could not write default settings: {}", err);
                }
                default
            }
        };
        settings.apply_env();
        settings
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let mut settings = serde_json::from_str::<Settings>(contents)?;
        settings.migrate();
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::settings_path() else {
            return Ok(());
        };
        // Ensure the directory exists
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    fn settings_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR).join("settings.json"))
    }

    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DATABASE_ENV) {
            if !path.is_empty() {
                self.database_path = PathBuf::from(path);
            }
        }
    }

    fn migrate(&mut self) {
        match self.version {
            0 | 1 => {
                // version 1 had no atomic writes
                self.atomic_finish_writes = true;
                self.version = 2;
            }
            _ => (),
        }
    }

    pub fn levels(&self) -> RangeInclusive<LevelNumber> {
        self.first_level..=self.last_level
    }

    /// `DEBUG=1` turns on debug logging when `RUST_LOG` is unset.
    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }
}
