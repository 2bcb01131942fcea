use buildpanel_core::{App, AppId, Settings};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

/// One entry of the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogMessage {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }

    /// Line appended to the daily log file.
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] {}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level,
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootState {
    Loading,
    Ready,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub boot: BootState,
    pub apps: Vec<App>,
    pub settings: Settings,
    pub logs: Vec<LogMessage>,
    pub error: Option<String>,
}

impl AppState {
    pub fn app(&self, id: &AppId) -> Option<&App> {
        self.apps.iter().find(|a| &a.id == id)
    }

    /// Exact id first, then case-insensitive name.
    pub fn find_app(&self, key: &str) -> Option<&App> {
        self.apps
            .iter()
            .find(|a| a.id.as_str() == key)
            .or_else(|| self.apps.iter().find(|a| a.name.eq_ignore_ascii_case(key)))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            boot: BootState::Loading,
            apps: Vec::new(),
            settings: Settings::default(),
            logs: Vec::new(),
            error: None,
        }
    }
}
