use buildpanel_core::{AppId, CommandId, Settings};
use camino::Utf8PathBuf;

#[derive(Debug, Clone)]
pub enum AppCommand {
    // Boot
    LoadInitialState,

    // Apps
    AddApp { name: String, path: Utf8PathBuf },
    DeleteApp(AppId),

    // Execution
    RunCommand { app_id: AppId, command_id: CommandId },

    // Settings / activity log
    UpdateSettings(Settings),
    ClearLogs,
    DismissError,
}
