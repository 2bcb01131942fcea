//! Central configuration constants for storage locations, buffers and cadence.

use std::time::Duration;

/// `directories::ProjectDirs` qualifier.
pub const QUALIFIER: &str = "com";

/// `directories::ProjectDirs` organization.
pub const ORG: &str = "buildpanel";

/// `directories::ProjectDirs` application name.
pub const APP: &str = "panel";

/// File holding the persisted list of apps.
pub const APPS_FILE: &str = "apps.json";

/// File holding user settings.
pub const SETTINGS_FILE: &str = "settings.json";

/// Prefix of the daily log file; the UTC date and `.log` are appended.
pub const LOG_FILE_PREFIX: &str = "buildpanel-";

/// Directory (relative to the executable) searched for markdown documents.
pub const DOCS_DIR: &str = "docs";

/// Size of each read from a child's stdout/stderr pipe.
pub const READ_BUFFER_BYTES: usize = 8 * 1024;

/// How often front-ends drain pending command updates.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Daily log file name for a `YYYY-MM-DD` date.
pub fn log_file_name(date: &str) -> String {
    format!("{LOG_FILE_PREFIX}{date}.log")
}
