use std::fs::create_dir_all;
use std::fs::remove_dir_all;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;
use tracing::error;

use crate::Error;
use crate::Result;

fn path_error(
    path: &Path,
    source: std::io::Error,
) -> Error {
    Error::PathError {
        path: path.to_path_buf(),
        source,
    }
}

/// Wipes `path` if present and recreates it empty.
pub fn prepare_dir(path: &Path) -> Result<()> {
    remove_dir_if_exists(path)?;
    create_dir_all(path).map_err(|e| {
        error!("Failed to create directory {:?}: {:?}", path, e);
        path_error(path, e)
    })?;
    debug!("prepared directory {:?}", path);
    Ok(())
}

/// Recursively deletes `path`. A missing directory is not an error.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(path_error(path, e)),
    }
}

pub fn open_file_for_append(path: &Path) -> Result<File> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            create_dir_all(parent_dir).map_err(|e| path_error(parent_dir, e))?;
        }
    }
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| path_error(path, e))
}
