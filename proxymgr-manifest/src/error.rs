//! Error types for proxymgr-manifest.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading, mutating or writing a build manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not well-formed XML or has no root element.
    #[error("cannot parse manifest {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
