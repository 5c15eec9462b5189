//! Error types for proxymgr-sync.

use std::path::PathBuf;

use thiserror::Error;

use proxymgr_codegen::GenerationError;
use proxymgr_core::{MappingError, ServiceName, StoreError};
use proxymgr_manifest::ManifestError;

/// Terminal failure of one synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Add was requested for a name that already has a reference group.
    #[error("a service reference named '{name}' already exists")]
    NameConflict { name: ServiceName },

    /// Configure was requested but no mapping record could be loaded.
    #[error("service reference '{name}' has no usable mapping: {source}")]
    MappingMissing {
        name: ServiceName,
        #[source]
        source: StoreError,
    },

    #[error("invalid service reference: {0}")]
    InvalidMapping(#[from] MappingError),

    /// The generator failed; the message is its diagnostic output.
    #[error(transparent)]
    GenerationFailed(#[from] GenerationError),

    #[error("failed to save mapping: {0}")]
    PersistFailed(#[from] StoreError),

    #[error("failed to update project manifest: {0}")]
    ManifestMutationFailed(#[from] ManifestError),
}

impl SyncError {
    /// Stable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::NameConflict { .. } => "NameConflict",
            SyncError::MappingMissing { .. } => "MappingMissing",
            SyncError::InvalidMapping(_) => "InvalidMapping",
            SyncError::GenerationFailed(_) => "GenerationFailed",
            SyncError::PersistFailed(_) => "PersistFailed",
            SyncError::ManifestMutationFailed(_) => "ManifestMutationFailed",
        }
    }
}

/// Failures reported by a [`crate::ProjectHost`]. Never terminal for a run.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkout of {path} failed: {message}")]
    Checkout { path: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}

/// Errors from the background [`crate::SyncWorker`].
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("a synchronization is already running")]
    Busy,

    /// The worker task ended without reporting, e.g. it panicked.
    #[error("synchronization task ended without a result")]
    ChannelClosed,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Convenience constructor for [`HostError::Io`].
pub fn host_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> HostError {
    HostError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn generation_failure_surfaces_diagnostic_verbatim() {
        let err = SyncError::from(GenerationError::NonZeroExit {
            exit_code: Some(1),
            diagnostic: "Error: Cannot obtain Metadata from https://svc/Input.svc\n".into(),
        });
        assert_eq!(err.kind(), "GenerationFailed");
        assert_eq!(
            err.to_string(),
            "Error: Cannot obtain Metadata from https://svc/Input.svc"
        );
    }

    #[rstest]
    #[case(SyncError::from(MappingError::EmptyName), "InvalidMapping")]
    #[case(SyncError::from(GenerationError::Cancelled), "GenerationFailed")]
    #[case(
        SyncError::from(GenerationError::TimedOut {
            timeout: std::time::Duration::from_secs(300)
        }),
        "GenerationFailed"
    )]
    fn kinds_follow_the_failing_step(#[case] err: SyncError, #[case] kind: &str) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn name_conflict_names_the_service() {
        let err = SyncError::NameConflict {
            name: ServiceName::from("Input"),
        };
        assert_eq!(err.kind(), "NameConflict");
        assert!(err.to_string().contains("'Input'"));
    }
}
