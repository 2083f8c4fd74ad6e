//! Application paths.

use std::path::{Path, PathBuf};

/// Application name, used for the default data directory.
pub const APP_NAME: &str = "sti-tracker";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STI_TRACKER_DATA_DIR";

const PREFERENCES_DIR: &str = "preference_settings";
const PREFERENCES_FILENAME: &str = "preferences.json";
const HISTORY_DIR: &str = "patient_files";
const HISTORY_FILENAME: &str = "patient_history.csv";
const LOG_DIR: &str = "log_files";

/// File name of the application log inside [`AppConfig::log_dir`].
pub const LOG_FILENAME: &str = "app.log";

/// Where the preferences, history and log files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub preferences_file: PathBuf,
    pub history_file: PathBuf,
    /// Directory holding the persistent application log
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Lay out both files under a single data directory.
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            preferences_file: data_dir.join(PREFERENCES_DIR).join(PREFERENCES_FILENAME),
            history_file: data_dir.join(HISTORY_DIR).join(HISTORY_FILENAME),
            log_dir: data_dir.join(LOG_DIR),
            data_dir,
        }
    }

    /// Use `STI_TRACKER_DATA_DIR` if set, the platform data directory otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::with_data_dir(PathBuf::from(dir)),
            _ => Self::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_data_dir(base.join(APP_NAME))
    }
}
