//! svcmap mapping store.
//!
//! # File format
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <ProxyInfo xmlns="urn:proxymgr:scvmap">
//!   <Name>Input</Name>
//!   <Url>https://svc/Input.svc</Url>
//!   <GenerateClient>false</GenerateClient>
//!   <UseXmlSerializer>false</UseXmlSerializer>
//!   <Serializer>Auto</Serializer>
//! </ProxyInfo>
//! ```
//!
//! `Serializer` is optional on load. Records written without it resolve
//! their serializer from `UseXmlSerializer` alone.
//!
//! Saves use the same `.tmp` sibling + rename pattern as every other writer in
//! the workspace, so a failed write never leaves a half-written record behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{store_io_err, StoreError};
use crate::types::{Serializer, ServiceMapping, ServiceName};

/// XML namespace of svcmap records.
pub const SVCMAP_NAMESPACE: &str = "urn:proxymgr:scvmap";

/// File extension of svcmap records, without the dot.
pub const SVCMAP_EXTENSION: &str = "svcmap";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// On-disk shape of a svcmap record.
#[derive(Debug, Serialize, Deserialize)]
struct SvcMapDocument {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Url", default)]
    url: String,
    #[serde(rename = "GenerateClient", default)]
    generate_client: bool,
    #[serde(rename = "UseXmlSerializer", default)]
    use_xml_serializer: bool,
    #[serde(
        rename = "Serializer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    serializer: Option<String>,
}

impl SvcMapDocument {
    fn from_mapping(mapping: &ServiceMapping) -> Self {
        Self {
            xmlns: SVCMAP_NAMESPACE.to_owned(),
            name: mapping.name.0.clone(),
            url: mapping.address.clone(),
            generate_client: mapping.generate_client,
            use_xml_serializer: mapping.serializer == Serializer::XmlSerializer,
            serializer: Some(mapping.serializer.as_str().to_owned()),
        }
    }

    fn into_mapping(self) -> Result<ServiceMapping, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("record has no Name".to_owned());
        }
        let serializer = match self.serializer.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<Serializer>().map_err(|e| e.to_string())?,
            _ if self.use_xml_serializer => Serializer::XmlSerializer,
            _ => Serializer::DataContract,
        };
        Ok(ServiceMapping {
            name: ServiceName::from(name),
            address: self.url.trim().to_owned(),
            generate_client: self.generate_client,
            serializer,
        })
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the mapping record at `path`.
///
/// Missing, unreadable and malformed files all come back as
/// [`StoreError::NotFound`] carrying the reason.
pub fn load(path: &Path) -> Result<ServiceMapping, StoreError> {
    let not_found = |reason: String| StoreError::NotFound {
        path: path.to_path_buf(),
        reason,
    };
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(not_found("file does not exist".to_owned()))
        }
        Err(e) => return Err(not_found(e.to_string())),
    };
    let contents = contents.trim_start_matches('\u{feff}');
    let document: SvcMapDocument =
        quick_xml::de::from_str(contents).map_err(|e| not_found(e.to_string()))?;
    let mapping = document.into_mapping().map_err(not_found)?;
    tracing::debug!("loaded mapping '{}' from {}", mapping.name, path.display());
    Ok(mapping)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Render a mapping as svcmap XML.
pub fn render(mapping: &ServiceMapping) -> Result<String, String> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some("ProxyInfo"))
        .map_err(|e| e.to_string())?;
    serializer.indent(' ', 2);
    SvcMapDocument::from_mapping(mapping)
        .serialize(serializer)
        .map_err(|e| e.to_string())?;
    Ok(format!("{XML_DECLARATION}{body}\n"))
}

/// Atomically write `mapping` to `path`, replacing any existing record.
///
/// Write flow: render → `<path>.tmp` → `rename`. The temp file is removed if
/// either step fails, leaving any previous record untouched.
pub fn save(path: &Path, mapping: &ServiceMapping) -> Result<(), StoreError> {
    let xml = render(mapping).map_err(|message| StoreError::Serialize {
        path: path.to_path_buf(),
        message,
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| store_io_err(parent, e))?;
    }

    let tmp = tmp_path(path);
    let written = std::fs::write(&tmp, xml)
        .map_err(|e| store_io_err(&tmp, e))
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| store_io_err(path, e)));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    tracing::debug!("saved mapping '{}' to {}", mapping.name, path.display());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.tmp", path.display()))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Every loadable mapping under `storage_root` (`<root>/<name>/<name>.svcmap`),
/// sorted by name. Folders without a usable record are skipped.
pub fn list(storage_root: &Path) -> Result<Vec<(PathBuf, ServiceMapping)>, StoreError> {
    if !storage_root.exists() {
        return Ok(vec![]);
    }
    let mut dirs: Vec<_> = std::fs::read_dir(storage_root)
        .map_err(|e| store_io_err(storage_root, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .collect();
    dirs.sort_by_key(|e| e.file_name());

    let mut found = Vec::new();
    for dir in dirs {
        let name = dir.file_name().to_string_lossy().into_owned();
        let path = dir.path().join(format!("{name}.{SVCMAP_EXTENSION}"));
        match load(&path) {
            Ok(mapping) => found.push((path, mapping)),
            Err(e) => tracing::debug!("skipping {}: {e}", dir.path().display()),
        }
    }
    Ok(found)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
