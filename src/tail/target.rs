use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use crate::error::{Result, TailError};

/// Absolute path of the file followed by one tail session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    path: PathBuf,
}

impl WatchTarget {
    /// Resolves `path` against the current directory. The file itself does
    /// not need to exist yet; its parent directory is checked when watching.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|e| TailError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if absolute.file_name().is_none() {
            return Err(TailError::InvalidPath {
                path: absolute,
                reason: "path does not name a file".to_string(),
            });
        }

        Ok(Self { path: absolute })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &OsStr {
        // `new` rejects paths without a final component
        self.path.file_name().unwrap_or_default()
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }
}
