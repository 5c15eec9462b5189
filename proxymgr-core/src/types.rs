//! Domain types for service proxies.
//!
//! A [`ServiceMapping`] is the record persisted next to each generated proxy;
//! everything else here describes how that record is interpreted.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::MappingError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a service proxy. Doubles as its storage folder name and as the
/// manifest dependency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(pub String);

impl ServiceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Serializer the generator is asked to use for data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Serializer {
    /// Let the generator pick.
    #[default]
    Auto,
    XmlSerializer,
    DataContract,
}

impl Serializer {
    /// Value of the generator's `/ser:` switch.
    pub fn generator_arg(self) -> &'static str {
        match self {
            Serializer::Auto => "Auto",
            Serializer::XmlSerializer => "XmlSerializer",
            Serializer::DataContract => "DataContractSerializer",
        }
    }

    /// Element text used in svcmap files.
    pub fn as_str(self) -> &'static str {
        match self {
            Serializer::Auto => "Auto",
            Serializer::XmlSerializer => "XmlSerializer",
            Serializer::DataContract => "DataContract",
        }
    }
}

impl fmt::Display for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Serializer {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Serializer::Auto),
            "xml" | "xmlserializer" => Ok(Serializer::XmlSerializer),
            "datacontract" | "datacontractserializer" => Ok(Serializer::DataContract),
            other => Err(MappingError::UnknownSerializer(other.to_owned())),
        }
    }
}

/// Target language of the host project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "cs")]
    CSharp,
    #[serde(rename = "vb")]
    VisualBasic,
}

impl Language {
    /// File extension of generated sources, also the generator's `/l:` value.
    pub fn extension(self) -> &'static str {
        match self {
            Language::CSharp => "cs",
            Language::VisualBasic => "vb",
        }
    }

    /// Resolve the language from a manifest file name (`.csproj` / `.vbproj`).
    ///
    /// Unknown manifest kinds fall back to C#.
    pub fn from_manifest(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("vbproj") => Language::VisualBasic,
            _ => Language::CSharp,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Language {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cs" | "csharp" | "c#" => Ok(Language::CSharp),
            "vb" | "visualbasic" => Ok(Language::VisualBasic),
            other => Err(MappingError::UnknownLanguage(other.to_owned())),
        }
    }
}

/// Whether a run creates a new proxy or regenerates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Add,
    Configure,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Add => write!(f, "add"),
            Mode::Configure => write!(f, "configure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// The inputs used to generate one proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMapping {
    pub name: ServiceName,
    /// Absolute URI or file path of the service description.
    pub address: String,
    /// Generate the client surface; when false only service contracts are emitted.
    pub generate_client: bool,
    pub serializer: Serializer,
}

impl ServiceMapping {
    /// A mapping with default options. Surrounding whitespace is trimmed
    /// from `address`.
    pub fn new(name: impl Into<ServiceName>, address: impl Into<String>) -> Self {
        let address: String = address.into();
        Self {
            name: name.into(),
            address: address.trim().to_owned(),
            generate_client: false,
            serializer: Serializer::Auto,
        }
    }

    /// Same mapping with a different serializer.
    pub fn with_serializer(self, serializer: Serializer) -> Self {
        Self { serializer, ..self }
    }

    /// Check the mapping can be handed to the generator.
    pub fn validate(&self) -> Result<(), MappingError> {
        validate_name(&self.name)?;
        if self.address.trim().is_empty() {
            return Err(MappingError::MissingAddress);
        }
        if self.address != self.address.trim() {
            return Err(MappingError::PaddedAddress {
                address: self.address.clone(),
            });
        }
        if !is_absolute_address(&self.address) {
            return Err(MappingError::RelativeAddress {
                address: self.address.clone(),
            });
        }
        Ok(())
    }
}

/// Edits applied to a stored mapping when reconfiguring a proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingEdits {
    pub address: Option<String>,
    pub generate_client: Option<bool>,
    pub serializer: Option<Serializer>,
}

impl MappingEdits {
    pub fn apply(&self, mapping: ServiceMapping) -> ServiceMapping {
        ServiceMapping {
            name: mapping.name,
            address: self
                .address
                .as_deref()
                .map(|a| a.trim().to_owned())
                .unwrap_or(mapping.address),
            generate_client: self.generate_client.unwrap_or(mapping.generate_client),
            serializer: self.serializer.unwrap_or(mapping.serializer),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.generate_client.is_none() && self.serializer.is_none()
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A service name must be usable as a single folder name.
pub fn validate_name(name: &ServiceName) -> Result<(), MappingError> {
    let raw = name.as_str();
    if raw.trim().is_empty() {
        return Err(MappingError::EmptyName);
    }
    let invalid = |reason| MappingError::InvalidName {
        name: raw.to_owned(),
        reason,
    };
    if raw.contains(INVALID_NAME_CHARS) {
        return Err(invalid("contains a path separator or reserved character"));
    }
    if raw.chars().any(char::is_control) {
        return Err(invalid("contains a control character"));
    }
    if raw == "." || raw == ".." {
        return Err(invalid("is a relative path component"));
    }
    if raw != raw.trim() || raw.ends_with('.') {
        return Err(invalid("has leading/trailing whitespace or a trailing dot"));
    }
    Ok(())
}

/// True for absolute URLs (`https://…`, `file:///…`) and absolute file paths
/// on either POSIX or Windows.
pub fn is_absolute_address(address: &str) -> bool {
    let address = address.trim();
    if address.is_empty() {
        return false;
    }
    if is_windows_absolute(address) || Path::new(address).is_absolute() {
        return true;
    }
    match Url::parse(address) {
        Ok(url) => !url.cannot_be_a_base(),
        Err(_) => false,
    }
}

fn is_windows_absolute(address: &str) -> bool {
    let bytes = address.as_bytes();
    if address.starts_with(r"\\") {
        return true;
    }
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
