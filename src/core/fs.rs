//! Filesystem helpers for provisioned outputs.
//!
//! Every output carries credentials, so files are written owner-only.

#[cfg(unix)]
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::core::constants::SECRET_FILE_MODE;
use crate::error::{FsError, Result};

/// Create a directory tree if it does not exist.
///
/// Returns `true` if the directory was created, `false` if it was
/// already present.
///
/// # Errors
///
/// Returns `FsError::NotADirectory` if the path exists as a file, or
/// `FsError::Directory` if creation fails.
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();

    if path.is_dir() {
        return Ok(false);
    }
    if path.exists() {
        return Err(FsError::NotADirectory(path.to_path_buf()).into());
    }

    std::fs::create_dir_all(path).map_err(|source| FsError::Directory {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "created directory");

    Ok(true)
}

/// Write `content` to `path` with owner-only read/write permission.
///
/// Parent directories are created as needed. An existing file is
/// truncated and its mode reset.
///
/// # Errors
///
/// Returns `FsError::Write` on any permission or disk error.
pub fn write_secret_file(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let wrap = |source: std::io::Error| FsError::Write {
        path: path.to_path_buf(),
        source,
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(SECRET_FILE_MODE)
            .open(path)
            .map_err(wrap)?;
        file.write_all(content.as_bytes()).map_err(wrap)?;
        file.flush().map_err(wrap)?;

        // mode() only applies on creation
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(SECRET_FILE_MODE))
            .map_err(wrap)?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content).map_err(wrap)?;
    }

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}
