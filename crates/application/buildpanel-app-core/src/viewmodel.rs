use buildpanel_core::{App, AppId, Command, CommandId, CommandStatus};

use crate::domain::{AppState, LogLevel, LogMessage};

fn status_label(status: CommandStatus) -> &'static str {
    match status {
        CommandStatus::Idle => "Idle",
        CommandStatus::Running => "Running...",
        CommandStatus::Success => "Success",
        CommandStatus::Error => "Failed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVm {
    pub id: CommandId,
    pub name: String,
    pub script: String,
    pub status: CommandStatus,
    pub status_label: &'static str,
    pub can_run: bool,
    pub output_len: usize,
}

impl From<&Command> for CommandVm {
    fn from(c: &Command) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            script: c.script.clone(),
            status: c.status,
            status_label: status_label(c.status),
            can_run: !c.status.is_running(),
            output_len: c.output.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCardVm {
    pub id: AppId,
    pub name: String,
    pub path: String,
    pub commands: Vec<CommandVm>,
}

pub fn app_card_vm(app: &App) -> AppCardVm {
    AppCardVm {
        id: app.id.clone(),
        name: app.name.clone(),
        path: app.path.to_string(),
        commands: app.commands.iter().map(CommandVm::from).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutputVm {
    pub app_name: String,
    pub command_name: String,
    pub status: CommandStatus,
    pub status_label: &'static str,
    pub output: String,
}

pub fn command_output_vm(
    state: &AppState,
    app_id: &AppId,
    command_id: &CommandId,
) -> Option<CommandOutputVm> {
    let app = state.app(app_id)?;
    let cmd = app.command(command_id)?;
    Some(CommandOutputVm {
        app_name: app.name.clone(),
        command_name: cmd.name.clone(),
        status: cmd.status,
        status_label: status_label(cmd.status),
        output: cmd.output.clone(),
    })
}

/// Entries whose level is in `levels`, oldest first. An empty filter keeps everything.
pub fn filter_logs<'a>(logs: &'a [LogMessage], levels: &[LogLevel]) -> Vec<&'a LogMessage> {
    logs.iter()
        .filter(|m| levels.is_empty() || levels.contains(&m.level))
        .collect()
}
