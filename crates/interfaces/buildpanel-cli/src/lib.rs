pub mod apps;
pub mod commands;
pub mod picker;

use anyhow::{Context, Result};
use buildpanel_app_core::{AppCommand, AppKernel, AppStore, Logged, UpdateBroadcaster};
use buildpanel_infra::ProcessRunner;
use buildpanel_persistence::{DailyLogFile, FilePersistence, StoragePaths};
use camino::{Utf8Path, Utf8PathBuf};
use tokio::runtime::Handle;

pub type CliKernel = AppKernel<
    Logged<FilePersistence>,
    Logged<FilePersistence>,
    Logged<DailyLogFile>,
    Logged<ProcessRunner<UpdateBroadcaster>>,
>;

/// A loaded kernel plus the storage it was loaded from.
pub struct Session {
    pub kernel: CliKernel,
    pub persistence: FilePersistence,
}

impl Session {
    /// `config_dir` overrides the platform data directory.
    pub fn open(config_dir: Option<&Utf8Path>, handle: Handle) -> Result<Self> {
        let paths = match config_dir {
            Some(dir) => StoragePaths::at(dir),
            None => StoragePaths::from_project_dirs()
                .context("Could not determine a data directory; pass --config-dir")?,
        };
        tracing::debug!("Using data directory {}", paths.root());

        let persistence = FilePersistence::new(paths);
        let bus = UpdateBroadcaster::new();
        let runner = ProcessRunner::new(bus.clone(), handle);

        let mut kernel = AppKernel::new(
            AppStore::default(),
            bus,
            Logged::new(persistence.clone()),
            Logged::new(persistence.clone()),
            Logged::new(persistence.daily_log()),
            Logged::new(runner),
        );
        kernel.dispatch(AppCommand::LoadInitialState);

        Ok(Self {
            kernel,
            persistence,
        })
    }
}

pub fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("Could not read the current directory")?;
    Utf8PathBuf::try_from(cwd).context("Current directory is not valid UTF-8")
}

/// Resolve `path` against the current directory; apps always store absolute paths.
pub fn absolutize(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    Ok(current_dir()?.join(path))
}
