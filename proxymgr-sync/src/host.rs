//! The narrow view of the hosting project that a synchronization needs.
//!
//! An editor integration implements [`ProjectHost`] over its own project
//! model; the `proxymgr` binary implements it over the manifest on disk.

use std::path::Path;
use std::sync::Arc;

use proxymgr_core::ServiceName;

use crate::error::HostError;

/// Capabilities the orchestrator asks of its host.
///
/// Only [`find_reference_group`](ProjectHost::find_reference_group) affects
/// the outcome of a run. Every other failure is logged and the run goes on.
pub trait ProjectHost {
    /// Whether the project already has a reference group named `name`.
    fn find_reference_group(&self, name: &ServiceName) -> bool;

    /// Make a read-only file under version control writable.
    fn checkout(&self, path: &Path) -> Result<(), HostError>;

    /// Persist any pending project changes held by the host.
    fn save(&self) -> Result<(), HostError>;

    /// Pick up manifest changes made behind the host's back.
    fn reload(&self) -> Result<(), HostError>;

    /// Reveal `path` (the reference group folder) to the user.
    fn select_node(&self, path: &Path) -> Result<(), HostError>;

    fn show_error(&self, message: &str);

    fn show_warning(&self, message: &str);
}

impl<T: ProjectHost + ?Sized> ProjectHost for &T {
    fn find_reference_group(&self, name: &ServiceName) -> bool {
        (**self).find_reference_group(name)
    }
    fn checkout(&self, path: &Path) -> Result<(), HostError> {
        (**self).checkout(path)
    }
    fn save(&self) -> Result<(), HostError> {
        (**self).save()
    }
    fn reload(&self) -> Result<(), HostError> {
        (**self).reload()
    }
    fn select_node(&self, path: &Path) -> Result<(), HostError> {
        (**self).select_node(path)
    }
    fn show_error(&self, message: &str) {
        (**self).show_error(message)
    }
    fn show_warning(&self, message: &str) {
        (**self).show_warning(message)
    }
}

impl<T: ProjectHost + ?Sized> ProjectHost for Arc<T> {
    fn find_reference_group(&self, name: &ServiceName) -> bool {
        (**self).find_reference_group(name)
    }
    fn checkout(&self, path: &Path) -> Result<(), HostError> {
        (**self).checkout(path)
    }
    fn save(&self) -> Result<(), HostError> {
        (**self).save()
    }
    fn reload(&self) -> Result<(), HostError> {
        (**self).reload()
    }
    fn select_node(&self, path: &Path) -> Result<(), HostError> {
        (**self).select_node(path)
    }
    fn show_error(&self, message: &str) {
        (**self).show_error(message)
    }
    fn show_warning(&self, message: &str) {
        (**self).show_warning(message)
    }
}
