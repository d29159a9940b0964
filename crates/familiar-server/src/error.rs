//! Bootstrap error types.
//!
//! Every [`BootstrapError`] is fatal: the sequence stops at the failing step
//! and the dashboard is never reachable. Per-key configuration problems are
//! not errors at this level; they are reported in
//! [`familiar_core::BindReport`].

use std::{io, net::SocketAddr, path::PathBuf};

use familiar_core::EntropyError;
use thiserror::Error;

/// An external collaborator (agent or dashboard) failed to start or run.
#[derive(Error, Debug)]
pub enum ExternalError {
    /// Agent constructor failed.
    #[error("agent construction failed: {0}")]
    Agent(String),

    /// Dashboard listener could not bind.
    ///
    /// No retry and no port hunting: a predictable bind address is what the
    /// host relies on.
    #[error("dashboard bind to {addr} failed: {reason}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// OS error text
        reason: String,
    },

    /// Dashboard asked to listen on a non-loopback interface.
    #[error("dashboard refuses non-loopback address {0}")]
    NonLoopback(SocketAddr),

    /// Dashboard failed while serving.
    #[error("dashboard server failed: {0}")]
    Serve(String),
}

/// Errors that abort a bootstrap.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// `data_dir` was relative.
    ///
    /// A relative path would resolve against whatever the working directory
    /// happens to be, not the host's private storage.
    #[error("data directory must be an absolute path: {}", .0.display())]
    InvalidDataDir(PathBuf),

    /// Secure random source failed.
    #[error(transparent)]
    Entropy(#[from] EntropyError),

    /// Directory creation or key file write failed.
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        /// Path being created or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Agent or dashboard failed to start.
    #[error("external startup failed: {0}")]
    ExternalStartup(#[from] ExternalError),
}

impl BootstrapError {
    /// Wrap an I/O error with the path it concerns.
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }
}
