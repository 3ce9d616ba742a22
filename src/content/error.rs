//! Content errors

use std::path::PathBuf;
use thiserror::Error;

use super::Section;

#[derive(Debug, Error)]
pub enum ContentError {
    /// The file is missing or lacks a title
    #[error("{section} document not found: {key}")]
    NotFound { section: Section, key: String },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub fn not_found(section: Section, key: impl Into<String>) -> Self {
        Self::NotFound {
            section,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
