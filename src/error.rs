// src/error.rs
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop an extraction run.
///
/// Root-scoped variants carry the root code so the failure can be logged
/// and reported against the partition that needs refetching.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request for root {root} failed: {reason}")]
    Transport { root: String, reason: String },

    #[error("unexpected payload for root {root}: {reason}")]
    MalformedResponse { root: String, reason: String },

    #[error("could not persist {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not read PDF {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExtractError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence { path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
