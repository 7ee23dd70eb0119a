//! Filesystem utilities.
//!
//! The binding file is rewritten through [`ConfigFile`], which enforces the
//! order every rewrite must follow:
//!
//! 1. the file still holds the bytes that were read (checked write)
//! 2. a backup of those bytes is written beside it
//! 3. the new text goes to a temp file in the same directory, which is then
//!    renamed over the original
//!
//! No step runs if the one before it failed. There is no locking; a writer
//! racing between the check and the rename is not detected.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;
use thiserror::Error;
use toml_edit::DocumentMut;

/// Failure while committing a rewrite.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("{} changed on disk since it was read; refusing to overwrite it", .path.display())]
    ConcurrentModification { path: PathBuf },

    #[error("failed to write backup {}: {source}", .path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("edit would leave {} unparseable: {message}", .path.display())]
    InvalidToml { path: PathBuf, message: String },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Backup location for `path` taken at `at`.
///
/// `wrangler.toml` becomes `wrangler.toml.backup.2024-05-01T10-20-30-123Z`.
pub fn backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".backup.{}", stamp));
    PathBuf::from(name)
}

/// Replace `path` with `contents` via a temp file and rename.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A configuration file read into memory, ready for a checked rewrite.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    original: String,
}

impl ConfigFile {
    /// Read `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let original = read_to_string(&path)?;
        Ok(ConfigFile { path, original })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents as they were when loaded.
    pub fn contents(&self) -> &str {
        &self.original
    }

    /// Replace the file with `contents`, backing up the loaded bytes first.
    ///
    /// Returns the backup path.
    pub fn commit(&self, contents: &str) -> Result<PathBuf, WriteError> {
        let io_err = |source| WriteError::Io {
            path: self.path.clone(),
            source,
        };

        let on_disk = fs::read_to_string(&self.path).map_err(io_err)?;
        if on_disk != self.original {
            return Err(WriteError::ConcurrentModification {
                path: self.path.clone(),
            });
        }

        if self.original.parse::<DocumentMut>().is_ok() {
            if let Err(e) = contents.parse::<DocumentMut>() {
                return Err(WriteError::InvalidToml {
                    path: self.path.clone(),
                    message: e.to_string(),
                });
            }
        }

        let backup = backup_path(&self.path, Utc::now());
        fs::write(&backup, self.original.as_bytes()).map_err(|source| {
            WriteError::BackupFailed {
                path: backup.clone(),
                source,
            }
        })?;
        tracing::debug!("backed up {} to {}", self.path.display(), backup.display());

        write_atomic(&self.path, contents).map_err(io_err)?;
        tracing::info!("rewrote {}", self.path.display());

        Ok(backup)
    }
}
