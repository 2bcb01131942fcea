use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::StorageError;

/// Parse `path`, or `T::default()` when the file does not exist yet.
pub(crate) fn read_json_or_default<T>(path: &Utf8Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    serde_json::from_str(&content).map_err(|source| StorageError::Serde {
        path: path.to_owned(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    path: &Utf8Path,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Serde {
        path: path.to_owned(),
        source,
    })?;
    atomic_write(path, json.as_bytes())
}

fn atomic_write(path: &Utf8Path, contents: &[u8]) -> Result<(), StorageError> {
    let tmp_path = Utf8PathBuf::from(format!("{path}.tmp"));

    let mut file = fs::File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
    file.write_all(contents)
        .map_err(|e| StorageError::io(&tmp_path, e))?;
    file.sync_all().map_err(|e| StorageError::io(&tmp_path, e))?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))?;
        }
        Err(e) => return Err(StorageError::io(path, e)),
    }

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
