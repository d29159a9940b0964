//! Data Root Redirector.
//!
//! All persistent state of the service lives under `<dataDir>/.familiar`. The
//! directory must exist before any collaborator that touches disk is
//! constructed; otherwise that collaborator falls back to its default
//! location under the user's home directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::BootstrapError;

/// Sandbox subdirectory inside the host data directory.
pub const DATA_ROOT_DIR: &str = ".familiar";

/// Root directory for all persistent service state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRoot(PathBuf);

impl DataRoot {
    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Path of an entry below the data root.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.0.join(relative)
    }
}

impl AsRef<Path> for DataRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Ensure `<base_dir>/.familiar` exists and return it.
///
/// Idempotent: an existing directory is accepted as is. A non-directory
/// occupying the path is a filesystem error.
pub fn redirect(base_dir: &Path) -> Result<DataRoot, BootstrapError> {
    let root = base_dir.join(DATA_ROOT_DIR);

    fs::create_dir_all(&root).map_err(|e| BootstrapError::filesystem(&root, e))?;

    let meta = fs::metadata(&root).map_err(|e| BootstrapError::filesystem(&root, e))?;
    if !meta.is_dir() {
        return Err(BootstrapError::filesystem(
            &root,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "data root is not a directory"),
        ));
    }

    tracing::debug!(path = %root.display(), "Data root ready");
    Ok(DataRoot(root))
}
