//! Persistence errors.

use nc_core::FormatError;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot rename {} to {new_name:?}: a file with that name already exists", from.display())]
    RenameConflict { from: PathBuf, new_name: String },

    #[error("invalid file name {0:?}")]
    InvalidName(String),

    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("failed to encode: {0}")]
    Encode(String),

    #[error("no file path set for this editor")]
    NoSaveTarget,

    #[error("save task failed: {0}")]
    WriteTask(String),

    #[error("canvas {0} cannot be deleted")]
    HomeCanvasLocked(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::Io { path, source }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<FormatError> for StoreError {
    fn from(err: FormatError) -> Self {
        Self::Encode(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
