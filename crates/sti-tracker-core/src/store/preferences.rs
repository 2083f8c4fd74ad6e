//! Preferences store (JSON file).

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::{write_atomic, StoreResult};
use crate::models::{Preferences, PreferencesUpdate};

/// Outcome of [`PreferencesStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferencesLoad {
    /// File read and applied
    Loaded,
    /// No file yet; defaults kept and onboarding is needed
    NotConfigured,
    /// File present but unreadable or not valid JSON; defaults kept
    Malformed,
    /// A load was already attempted this session; nothing read
    AlreadyLoaded,
}

/// Holds the current preferences and persists them as a whole.
#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    prefs: Preferences,
    loaded: bool,
}

impl PreferencesStore {
    /// Create a store with empty defaults. Nothing is read until [`load`](Self::load).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            prefs: Preferences::default(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Whether a load has been attempted, successful or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Read the file once per session. Later calls are no-ops.
    ///
    /// Missing or malformed files never fail the session: defaults stay in
    /// place and the outcome says why.
    pub fn load(&mut self) -> PreferencesLoad {
        if self.loaded {
            return PreferencesLoad::AlreadyLoaded;
        }
        self.loaded = true;

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Preferences file not found, using defaults");
                return PreferencesLoad::NotConfigured;
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Could not read preferences, using defaults");
                return PreferencesLoad::Malformed;
            }
        };

        match serde_json::from_str::<PreferencesUpdate>(&raw) {
            Ok(update) => {
                self.prefs.apply(update);
                info!(path = %self.path.display(), "Preferences loaded");
                PreferencesLoad::Loaded
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Invalid preferences JSON, using defaults");
                PreferencesLoad::Malformed
            }
        }
    }

    /// Overwrite only the fields present in `update`. Does not save.
    pub fn set(&mut self, update: PreferencesUpdate) {
        self.prefs.apply(update);
        debug!(
            tracked = ?self.prefs.tracked_stis,
            reminder = ?self.prefs.reminder_hour,
            tags = ?self.prefs.profile_tags,
            "Preferences updated"
        );
    }

    /// Write the current preferences, replacing the file.
    pub fn save(&self) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&self.prefs)?;
        if let Err(e) = write_atomic(&self.path, json.as_bytes()) {
            error!(path = %self.path.display(), error = %e, "Failed to save preferences");
            return Err(e);
        }
        info!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }

    /// Clear every field and save immediately.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.prefs = Preferences::default();
        warn!("Preferences reset to defaults");
        self.save()
    }

    /// True once at least one STI is tracked.
    pub fn is_configured(&self) -> bool {
        self.prefs.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> PreferencesStore {
        PreferencesStore::new(dir.path().join("prefs").join("preferences.json"))
    }

    fn sample() -> Preferences {
        Preferences {
            tracked_stis: vec!["HIV".into(), "Gonorrhea".into()],
            reminder_hour: Some("20:00".into()),
            profile_tags: vec!["PrEP user".into(), "Multiple partners".into()],
        }
    }

    #[test]
    fn test_missing_file_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        assert_eq!(store.load(), PreferencesLoad::NotConfigured);
        assert_eq!(store.preferences(), &Preferences::default());
        assert!(!store.is_configured());
        assert!(store.is_loaded());
    }

    #[test]
    fn test_save_then_load_in_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.set(sample().into());
        store.save().unwrap();

        let mut fresh = store_in(&dir);
        assert_eq!(fresh.load(), PreferencesLoad::Loaded);
        assert_eq!(fresh.preferences(), &sample());
        assert!(fresh.is_configured());
    }

    #[test]
    fn test_malformed_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), PreferencesLoad::Malformed);
        assert_eq!(store.preferences(), &Preferences::default());
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"tracked_stis": 3}"#).unwrap();

        assert_eq!(store.load(), PreferencesLoad::Malformed);
        assert!(!store.is_configured());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"tracked_stis": ["HIV"]}"#).unwrap();

        assert_eq!(store.load(), PreferencesLoad::Loaded);
        assert_eq!(store.preferences().tracked_stis, vec!["HIV".to_string()]);
        assert_eq!(store.preferences().reminder_hour, None);
        assert!(store.preferences().profile_tags.is_empty());
    }

    #[test]
    fn test_second_load_reads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = store_in(&dir);
        writer.set(sample().into());
        writer.save().unwrap();

        let mut store = store_in(&dir);
        assert_eq!(store.load(), PreferencesLoad::Loaded);

        // Changing the file after the first load must not be picked up.
        std::fs::write(store.path(), r#"{"tracked_stis": ["Syphilis"]}"#).unwrap();
        assert_eq!(store.load(), PreferencesLoad::AlreadyLoaded);
        assert_eq!(store.preferences(), &sample());
    }

    /// Shared buffer the test subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_second_load_logs_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = store_in(&dir);
        writer.set(sample().into());
        writer.save().unwrap();

        let logs = LogBuffer::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();

        let mut store = store_in(&dir);
        tracing::subscriber::with_default(subscriber, || {
            store.load();
            store.load();
        });

        let output = logs.contents();
        assert_eq!(output.matches("Preferences loaded").count(), 1);
        assert!(!output.contains("Preferences file not found"));
    }

    #[test]
    fn test_failed_load_also_counts_as_attempted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(store.load(), PreferencesLoad::NotConfigured);

        let mut writer = store_in(&dir);
        writer.set(sample().into());
        writer.save().unwrap();

        assert_eq!(store.load(), PreferencesLoad::AlreadyLoaded);
        assert!(!store.is_configured());
    }

    #[test]
    fn test_reset_clears_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.set(sample().into());
        store.save().unwrap();

        store.reset().unwrap();
        assert!(!store.is_configured());

        let mut fresh = store_in(&dir);
        assert_eq!(fresh.load(), PreferencesLoad::Loaded);
        assert_eq!(fresh.preferences(), &Preferences::default());
    }

    #[test]
    fn test_saved_file_uses_expected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.set(sample().into());
        store.save().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["tracked_stis"][0], "HIV");
        assert_eq!(value["reminder_hour"], "20:00");
        assert_eq!(value["profile_tags"][1], "Multiple partners");
    }
}
