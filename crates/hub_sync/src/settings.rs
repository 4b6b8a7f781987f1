use std::path::PathBuf;

use engine::PayrollSettings;
use tracing::{info, warn};

use crate::{
    SyncError,
    persist::{read_json_file, write_json_file},
};

/// Payroll settings kept next to the cache, one JSON document.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: PayrollSettings,
}

impl SettingsStore {
    /// Falls back to the defaults when the file is missing or unreadable.
    pub fn load_or_default(path: PathBuf) -> Self {
        let current = match read_json_file::<PayrollSettings>(&path) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!(path = %path.display(), "no settings file, using defaults");
                PayrollSettings::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
                PayrollSettings::default()
            }
        };
        Self { path, current }
    }

    pub fn get(&self) -> &PayrollSettings {
        &self.current
    }

    /// Replaces the settings and writes them out.
    pub fn replace(&mut self, settings: PayrollSettings) -> Result<(), SyncError> {
        write_json_file(&self.path, &settings)?;
        self.current = settings;
        Ok(())
    }
}
