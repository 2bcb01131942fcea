use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not determine a configuration directory")]
    NoConfigDir,
    #[error("storage path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Serde {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid document name: {0}")]
    InvalidDocumentName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    Location,
    Io,
    Codec,
    InvalidPath,
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::NoConfigDir | StorageError::NonUtf8Path(_) => StorageErrorKind::Location,
            StorageError::Io { .. } => StorageErrorKind::Io,
            StorageError::Serde { .. } => StorageErrorKind::Codec,
            StorageError::InvalidDocumentName(_) => StorageErrorKind::InvalidPath,
        }
    }

    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
