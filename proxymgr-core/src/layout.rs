//! On-disk layout of a proxy inside a host project.
//!
//! ```text
//! <project-dir>/
//!   <folder>/                       WCFMetadata include
//!     <name>/                       WCFMetadataStorage include
//!       <name>.svcmap               mapping record
//!       <name>.proxy.<ext>          generated source
//! ```
//!
//! Manifest includes are always written with `\` separators and are relative
//! to the project directory; filesystem paths use the platform separator.

use std::path::{Path, PathBuf};

use crate::store::SVCMAP_EXTENSION;
use crate::types::{Language, ServiceName};

/// Paths for one named proxy. Pure, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyLayout {
    pub project_dir: PathBuf,
    pub folder_name: String,
    pub name: ServiceName,
    pub language: Language,
}

impl ProxyLayout {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        folder_name: impl Into<String>,
        name: ServiceName,
        language: Language,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            folder_name: folder_name.into(),
            name,
            language,
        }
    }

    /// `<project-dir>/<folder>/`
    pub fn storage_root(&self) -> PathBuf {
        storage_root(&self.project_dir, &self.folder_name)
    }

    /// `<project-dir>/<folder>/<name>/`
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_root().join(&self.name.0)
    }

    /// `<name>.svcmap`
    pub fn mapping_file_name(&self) -> String {
        format!("{}.{SVCMAP_EXTENSION}", self.name)
    }

    /// `<name>.proxy.<ext>`
    pub fn artifact_file_name(&self) -> String {
        format!("{}.proxy.{}", self.name, self.language.extension())
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.storage_dir().join(self.mapping_file_name())
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.storage_dir().join(self.artifact_file_name())
    }

    /// `<folder>\`
    pub fn folder_include(&self) -> String {
        format!("{}\\", self.folder_name)
    }

    /// `<folder>\<name>\`
    pub fn storage_include(&self) -> String {
        format!("{}\\{}\\", self.folder_name, self.name)
    }

    /// `<folder>\<name>\<name>.proxy.<ext>`
    pub fn artifact_include(&self) -> String {
        format!("{}{}", self.storage_include(), self.artifact_file_name())
    }

    /// `<folder>\<name>\<name>.svcmap`
    pub fn mapping_include(&self) -> String {
        format!("{}{}", self.storage_include(), self.mapping_file_name())
    }
}

/// `<project-dir>/<folder>/`
pub fn storage_root(project_dir: &Path, folder_name: &str) -> PathBuf {
    project_dir.join(folder_name)
}
