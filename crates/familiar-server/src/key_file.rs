//! Key Exchange File.
//!
//! The host learns the current dashboard key by reading
//! `<dataDir>/.dashboard_key` after start. The file holds exactly the key
//! text, no trailing newline, and is replaced on every start.
//!
//! # Atomicity
//!
//! Writes go to a temporary file in the same directory, are flushed to disk,
//! then renamed over the target. A concurrent reader sees either the previous
//! key or the new one, never a prefix. On Unix the temporary file is created
//! with mode `0600`, which the rename preserves.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use familiar_crypto::DashboardKey;
use tempfile::NamedTempFile;

use crate::error::BootstrapError;

/// File name of the key exchange file inside the host data directory.
pub const KEY_FILE_NAME: &str = ".dashboard_key";

/// Location of the key exchange file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchangeFile {
    path: PathBuf,
}

impl KeyExchangeFile {
    /// Key file inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self { path: data_dir.join(KEY_FILE_NAME) }
    }

    /// Full path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the file contents with `key`.
    ///
    /// The parent directory must already exist.
    pub fn write(&self, key: &DashboardKey) -> Result<(), BootstrapError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let fs_err = |e: io::Error| BootstrapError::filesystem(&self.path, e);

        let mut tmp = NamedTempFile::new_in(dir).map_err(fs_err)?;
        tmp.write_all(key.as_str().as_bytes()).map_err(fs_err)?;
        tmp.as_file().sync_all().map_err(fs_err)?;
        tmp.persist(&self.path).map_err(|e| fs_err(e.error))?;

        tracing::debug!(path = %self.path.display(), "Dashboard key file written");
        Ok(())
    }

    /// Read the current key, as the host does after start.
    pub fn read(&self) -> Result<String, BootstrapError> {
        fs::read_to_string(&self.path).map_err(|e| BootstrapError::filesystem(&self.path, e))
    }
}
