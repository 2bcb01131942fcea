use std::fs::OpenOptions;
use std::io::Write;

use camino::Utf8PathBuf;
use chrono::{NaiveDate, Utc};

use crate::{StorageError, StoragePaths};

/// Append-only log file that rolls over at UTC midnight.
#[derive(Debug, Clone)]
pub struct DailyLogFile {
    paths: StoragePaths,
}

impl DailyLogFile {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn path_for(&self, date: NaiveDate) -> Utf8PathBuf {
        self.paths.log_file(&date.format("%Y-%m-%d").to_string())
    }

    pub fn today(&self) -> Utf8PathBuf {
        self.path_for(Utc::now().date_naive())
    }

    /// Append `line` verbatim to today's file; the caller supplies the newline.
    pub fn append(&self, line: &str) -> Result<(), StorageError> {
        self.paths.ensure_root()?;
        let path = self.today();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| StorageError::io(&path, e))
    }

    /// Today's contents, empty when nothing was logged yet.
    pub fn read_today(&self) -> Result<String, StorageError> {
        let path = self.today();
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_carries_the_date() {
        let log = DailyLogFile::new(StoragePaths::at("/data"));
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(log.path_for(date), "/data/buildpanel-2024-03-09.log");
    }
}
