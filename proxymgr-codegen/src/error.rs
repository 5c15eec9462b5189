//! Error types for proxymgr-codegen.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single generator run.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generator executable could not be found.
    #[error("code generator not found: {tool}")]
    ToolNotFound { tool: PathBuf },

    /// The generator could not be started.
    #[error("failed to start code generator {tool}: {source}")]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure around the run (output folder, waiting on the child).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generator exited non-zero; its diagnostic text is the message.
    #[error("{}", exit_message(.exit_code, .diagnostic))]
    NonZeroExit {
        exit_code: Option<i32>,
        diagnostic: String,
    },

    /// The generator ran longer than the configured bound and was killed.
    #[error("code generator timed out after {timeout:?} and was stopped")]
    TimedOut { timeout: Duration },

    /// The run was cancelled by the caller and the generator was killed.
    #[error("code generation cancelled")]
    Cancelled,
}

fn exit_message(exit_code: &Option<i32>, diagnostic: &str) -> String {
    let diagnostic = diagnostic.trim();
    if !diagnostic.is_empty() {
        return diagnostic.to_owned();
    }
    match exit_code {
        Some(code) => format!("code generator exited with status {code}"),
        None => "code generator was terminated by a signal".to_owned(),
    }
}

/// Why a generated artifact could not be inspected.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot inspect {path}: unsupported source language")]
    UnsupportedLanguage { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GenerationError {
    GenerationError::Io {
        path: path.into(),
        source,
    }
}
