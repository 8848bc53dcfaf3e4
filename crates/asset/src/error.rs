//! Errors produced while reading or decoding asset files.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// File missing or unreadable.
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Malformed content; `line` is 1-based.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Scene-graph document could not be opened or its buffers resolved.
    #[error("Failed to import scene {}: {message}", path.display())]
    Import { path: PathBuf, message: String },
    /// Image decoding failed.
    #[error("Failed to decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn import(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Import {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
