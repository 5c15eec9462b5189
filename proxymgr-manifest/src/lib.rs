//! proxymgr-manifest: build manifest model and idempotent item upserts.

mod document;
pub mod entry;
pub mod error;
pub mod mutator;

pub use entry::{normalize_include, EntryKind, ManifestEntry};
pub use error::ManifestError;
pub use mutator::{apply, contains, plan, upsert, ManifestPlan, UpsertOutcome};
