use buildpanel_core::{App, AppId, CommandId, Settings};
use camino::{Utf8Path, Utf8PathBuf};

pub trait AppsRepo: Send + Sync + 'static {
    fn load(&self) -> anyhow::Result<Vec<App>>;
    fn save(&self, apps: &[App]) -> anyhow::Result<()>;
}

pub trait SettingsRepo: Send + Sync + 'static {
    fn load(&self) -> anyhow::Result<Settings>;
    fn save(&self, settings: &Settings) -> anyhow::Result<()>;
}

/// Receives fully formatted activity log lines, newline included.
pub trait LogSink: Send + Sync + 'static {
    fn append(&self, line: &str) -> anyhow::Result<()>;
}

/// Starts a command and returns immediately; progress arrives as
/// [`buildpanel_core::CommandUpdateEvent`]s on whatever sink the runner was built with.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(
        &self,
        app_id: AppId,
        command_id: CommandId,
        cwd: &Utf8Path,
        script: &str,
    ) -> anyhow::Result<()>;
}

/// `None` when the user cancelled.
pub trait DirectoryPicker {
    fn select_directory(&mut self) -> Option<Utf8PathBuf>;
}

pub trait DocumentSource: Send + Sync + 'static {
    fn markdown(&self, filename: &str) -> String;
}
