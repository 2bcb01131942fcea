use buildpanel_core::{App, Settings};
use buildpanel_persistence::{DailyLogFile, FilePersistence, MarkdownDocs};

use crate::ports::{AppsRepo, DocumentSource, LogSink, SettingsRepo};

impl AppsRepo for FilePersistence {
    fn load(&self) -> anyhow::Result<Vec<App>> {
        Ok(self.load_apps()?)
    }

    fn save(&self, apps: &[App]) -> anyhow::Result<()> {
        Ok(self.save_apps(apps)?)
    }
}

impl SettingsRepo for FilePersistence {
    fn load(&self) -> anyhow::Result<Settings> {
        Ok(self.load_settings()?)
    }

    fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        Ok(self.save_settings(settings)?)
    }
}

impl LogSink for DailyLogFile {
    fn append(&self, line: &str) -> anyhow::Result<()> {
        Ok(DailyLogFile::append(self, line)?)
    }
}

impl DocumentSource for MarkdownDocs {
    fn markdown(&self, filename: &str) -> String {
        MarkdownDocs::markdown(self, filename)
    }
}
