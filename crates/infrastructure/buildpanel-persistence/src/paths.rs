use buildpanel_config::{APP, APPS_FILE, ORG, QUALIFIER, SETTINGS_FILE};
use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;

use crate::StorageError;

/// Where the app list, settings and daily logs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    root: Utf8PathBuf,
}

impl StoragePaths {
    /// Platform config directory, e.g. `~/.config/panel` on Linux.
    pub fn from_project_dirs() -> Result<Self, StorageError> {
        let proj_dirs =
            ProjectDirs::from(QUALIFIER, ORG, APP).ok_or(StorageError::NoConfigDir)?;
        let root = Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf())
            .map_err(|p| StorageError::NonUtf8Path(p.to_string_lossy().into_owned()))?;
        Ok(Self { root })
    }

    pub fn at(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn apps_file(&self) -> Utf8PathBuf {
        self.root.join(APPS_FILE)
    }

    pub fn settings_file(&self) -> Utf8PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Daily log file for a `YYYY-MM-DD` date.
    pub fn log_file(&self, date: &str) -> Utf8PathBuf {
        self.root.join(buildpanel_config::log_file_name(date))
    }

    pub(crate) fn ensure_root(&self) -> Result<(), StorageError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)
                .map_err(|e| StorageError::io(self.root.clone(), e))?;
        }
        Ok(())
    }
}
