//! proxymgr core library — domain types, svcmap store, configuration, layout.
//!
//! - [`types`] — newtypes, enums and the [`ServiceMapping`] record
//! - [`store`] — load / save / list svcmap files
//! - [`config`] — `.proxymgr.yaml` resolution
//! - [`layout`] — where a proxy's files live and how the manifest names them
//! - [`error`] — [`StoreError`], [`ConfigError`], [`MappingError`]

pub mod config;
pub mod error;
pub mod layout;
pub mod store;
pub mod types;

pub use config::ProxyConfig;
pub use error::{ConfigError, MappingError, StoreError};
pub use layout::ProxyLayout;
pub use types::{Language, MappingEdits, Mode, Serializer, ServiceMapping, ServiceName};
