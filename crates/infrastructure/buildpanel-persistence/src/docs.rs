use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::StorageError;

/// Markdown documents shipped next to the binary.
#[derive(Debug, Clone)]
pub struct MarkdownDocs {
    root: Utf8PathBuf,
}

impl MarkdownDocs {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn read(&self, filename: &str) -> Result<String, StorageError> {
        let rel = Utf8Path::new(filename);
        let plain = !filename.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Utf8Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidDocumentName(filename.to_string()));
        }

        let path = self.root.join(rel);
        std::fs::read_to_string(&path).map_err(|e| StorageError::io(path, e))
    }

    /// Document text, or a small markdown page describing why it could not be
    /// loaded. Never fails.
    pub fn markdown(&self, filename: &str) -> String {
        match self.read(filename) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error reading markdown file {filename}: {e}");
                error_document(filename, &e)
            }
        }
    }
}

fn error_document(filename: &str, err: &StorageError) -> String {
    let reason = match err {
        StorageError::Io { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    format!("# Error\n\nCould not load file: {filename}. Reason: {reason}")
}
