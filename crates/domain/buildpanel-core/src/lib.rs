use serde::{Deserialize, Serialize};

pub mod event;
pub mod model;
pub mod reducer;
pub mod settings;
pub mod template;

pub use event::{CommandUpdateEvent, EventSink};
pub use model::{derive_app_name, App, AppId, Command, CommandId};
pub use reducer::{apply, apply_in_place};
pub use settings::Settings;
pub use template::{default_commands, CommandTemplate, DEFAULT_COMMANDS};

/// Lifecycle of a single command. `Idle` is the initial state; `Success` and
/// `Error` end a run, and any state may re-enter `Running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

impl CommandStatus {
    pub fn is_running(self) -> bool {
        matches!(self, CommandStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CommandStatus::Success | CommandStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandStatus::Idle => "idle",
            CommandStatus::Running => "running",
            CommandStatus::Success => "success",
            CommandStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
