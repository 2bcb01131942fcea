use buildpanel_core::{App, AppId, CommandId, Settings};
use camino::Utf8Path;
use tracing::{debug, warn};

use crate::ports::{AppsRepo, CommandRunner, LogSink, SettingsRepo};

/// Wraps a port and traces every call across it.
#[derive(Debug, Clone)]
pub struct Logged<T> {
    inner: T,
}

impl<T> Logged<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: CommandRunner> CommandRunner for Logged<T> {
    fn run(
        &self,
        app_id: AppId,
        command_id: CommandId,
        cwd: &Utf8Path,
        script: &str,
    ) -> anyhow::Result<()> {
        debug!(%app_id, %command_id, %cwd, script, "run requested");
        let res = self.inner.run(app_id.clone(), command_id.clone(), cwd, script);
        if let Err(e) = &res {
            warn!(%app_id, %command_id, "run rejected: {e:#}");
        }
        res
    }
}

impl<T: AppsRepo> AppsRepo for Logged<T> {
    fn load(&self) -> anyhow::Result<Vec<App>> {
        let res = self.inner.load();
        match &res {
            Ok(apps) => debug!(count = apps.len(), "apps loaded"),
            Err(e) => warn!("loading apps failed: {e:#}"),
        }
        res
    }

    fn save(&self, apps: &[App]) -> anyhow::Result<()> {
        let res = self.inner.save(apps);
        match &res {
            Ok(()) => debug!(count = apps.len(), "apps saved"),
            Err(e) => warn!("saving apps failed: {e:#}"),
        }
        res
    }
}

impl<T: SettingsRepo> SettingsRepo for Logged<T> {
    fn load(&self) -> anyhow::Result<Settings> {
        let res = self.inner.load();
        match &res {
            Ok(s) => debug!(auto_save_log = s.auto_save_log, "settings loaded"),
            Err(e) => warn!("loading settings failed: {e:#}"),
        }
        res
    }

    fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let res = self.inner.save(settings);
        match &res {
            Ok(()) => debug!(auto_save_log = settings.auto_save_log, "settings saved"),
            Err(e) => warn!("saving settings failed: {e:#}"),
        }
        res
    }
}

impl<T: LogSink> LogSink for Logged<T> {
    fn append(&self, line: &str) -> anyhow::Result<()> {
        let res = self.inner.append(line);
        if let Err(e) = &res {
            // Not routed back into the activity log, or a failing sink would recurse.
            warn!("appending to log file failed: {e:#}");
        }
        res
    }
}
