use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Append every activity log entry to the daily log file.
    #[serde(default)]
    pub auto_save_log: bool,
}
