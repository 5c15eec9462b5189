//! Error types for proxymgr-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the svcmap mapping store.
///
/// Loads only ever fail with [`StoreError::NotFound`]: a missing, unreadable
/// or malformed file is reported, never half-parsed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No usable mapping record at the path.
    #[error("no usable mapping at {path}: {reason}")]
    NotFound { path: PathBuf, reason: String },

    /// Underlying I/O failure while writing, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record could not be rendered as XML.
    #[error("failed to serialize mapping for {path}: {message}")]
    Serialize { path: PathBuf, message: String },
}

/// Errors from loading `.proxymgr.yaml` configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// A service mapping that cannot be handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error("service name '{name}' is not a valid folder name: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("service address is required")]
    MissingAddress,

    #[error("service address '{address}' has leading or trailing whitespace")]
    PaddedAddress { address: String },

    #[error("service address '{address}' is not an absolute URI or file path")]
    RelativeAddress { address: String },

    #[error("unknown serializer '{0}'; expected: auto, xml, datacontract")]
    UnknownSerializer(String),

    #[error("unknown language '{0}'; expected: cs, vb")]
    UnknownLanguage(String),
}

pub(crate) fn store_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
