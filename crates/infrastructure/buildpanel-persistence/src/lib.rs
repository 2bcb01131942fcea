mod docs;
mod error;
mod json_store;
mod log_file;
mod paths;

pub use docs::MarkdownDocs;
pub use error::{StorageError, StorageErrorKind};
pub use log_file::DailyLogFile;
pub use paths::StoragePaths;

use buildpanel_core::{App, Settings};

/// JSON files for the app list and settings.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    paths: StoragePaths,
}

impl FilePersistence {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// Default platform location.
    pub fn from_project_dirs() -> Result<Self, StorageError> {
        Ok(Self::new(StoragePaths::from_project_dirs()?))
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn load_apps(&self) -> Result<Vec<App>, StorageError> {
        json_store::read_json_or_default(&self.paths.apps_file())
    }

    pub fn save_apps(&self, apps: &[App]) -> Result<(), StorageError> {
        self.paths.ensure_root()?;
        json_store::write_json(&self.paths.apps_file(), apps)
    }

    pub fn load_settings(&self) -> Result<Settings, StorageError> {
        json_store::read_json_or_default(&self.paths.settings_file())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.paths.ensure_root()?;
        json_store::write_json(&self.paths.settings_file(), settings)
    }

    pub fn daily_log(&self) -> DailyLogFile {
        DailyLogFile::new(self.paths.clone())
    }
}
