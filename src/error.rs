use std::{io, path::PathBuf, str::Utf8Error};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TailError {
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// The directory holding the file could not be watched.
    #[error("Could not watch {path:?}: {reason}")]
    NotifierSetup { path: PathBuf, reason: String },

    /// The file's length could not be determined.
    #[error("Could not stat {path:?}")]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening, seeking or reading the delta region failed, e.g. because an
    /// editor is still holding the file.
    #[error("Could not read {path:?} from byte {offset}")]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Text appended to {path:?} at byte {offset} is not valid UTF-8")]
    Decode {
        path: PathBuf,
        offset: u64,
        #[source]
        source: Utf8Error,
    },

    #[error("Could not start the tail worker thread")]
    Spawn(#[source] io::Error),

    #[error("Tail session is {0}, expected idle")]
    InvalidState(&'static str),
}

impl TailError {
    /// Whether retrying the same region on a later tick could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, TailError::Inaccessible { .. } | TailError::Read { .. })
    }
}

pub type Result<T> = std::result::Result<T, TailError>;
