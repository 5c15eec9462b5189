//! Per-project settings and the per-run workflow context.

use std::path::{Path, PathBuf};
use std::time::Duration;

use proxymgr_codegen::{namespace_for, GenerationRequest};
use proxymgr_core::{Language, Mode, ProxyConfig, ProxyLayout, Serializer, ServiceMapping, ServiceName};
use proxymgr_manifest::{EntryKind, ManifestEntry};

/// Value of the `Generator` tag on mapping-record items.
pub const GENERATOR_TAG: &str = "Proxy Manager";

/// Framework assemblies every generated proxy depends on.
pub const FRAMEWORK_REFERENCES: [&str; 2] = ["System.Runtime.Serialization", "System.ServiceModel"];

/// The project a synchronizer works on, with resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTarget {
    pub manifest_path: PathBuf,
    pub folder_name: String,
    pub language: Language,
    pub generator: PathBuf,
    pub timeout: Duration,
}

impl ProjectTarget {
    pub fn from_config(manifest_path: impl Into<PathBuf>, config: &ProxyConfig) -> Self {
        let manifest_path = manifest_path.into();
        let language = config
            .language
            .unwrap_or_else(|| Language::from_manifest(&manifest_path));
        Self {
            folder_name: config.folder_name.clone(),
            language,
            generator: config.generator.clone(),
            timeout: config.timeout(),
            manifest_path,
        }
    }

    /// Directory holding the manifest; includes are relative to it.
    pub fn project_dir(&self) -> PathBuf {
        match self.manifest_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Manifest file stem, the root of generated namespaces.
    pub fn project_name(&self) -> String {
        self.manifest_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn layout(&self, name: ServiceName) -> ProxyLayout {
        ProxyLayout::new(self.project_dir(), self.folder_name.clone(), name, self.language)
    }

    pub fn context(&self, name: ServiceName, mode: Mode) -> WorkflowContext {
        WorkflowContext {
            layout: self.layout(name),
            manifest_path: self.manifest_path.clone(),
            project_name: self.project_name(),
            mode,
        }
    }
}

/// Everything derived once per run: paths, language and mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowContext {
    pub layout: ProxyLayout,
    pub manifest_path: PathBuf,
    pub project_name: String,
    pub mode: Mode,
}

impl WorkflowContext {
    pub fn name(&self) -> &ServiceName {
        &self.layout.name
    }

    pub fn extension(&self) -> &'static str {
        self.layout.language.extension()
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.layout.mapping_path()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.layout.artifact_path()
    }

    pub fn namespace(&self) -> String {
        namespace_for(&self.project_name, self.layout.name.as_str())
    }

    /// Generator invocation for `mapping` using `serializer`.
    pub fn generation_request(
        &self,
        mapping: &ServiceMapping,
        serializer: Serializer,
        tool: &Path,
        timeout: Duration,
    ) -> GenerationRequest {
        GenerationRequest {
            tool: tool.to_path_buf(),
            address: mapping.address.clone(),
            output: self.artifact_path(),
            language: self.layout.language,
            serializer,
            generate_client: mapping.generate_client,
            namespace: self.namespace(),
            timeout,
        }
    }

    /// Manifest items to upsert for this run's mode.
    ///
    /// Add writes the shared folder and framework references as well as the
    /// per-service items; Configure only refreshes the per-service items.
    pub fn manifest_entries(&self) -> Vec<ManifestEntry> {
        let layout = &self.layout;
        let per_service = [
            ManifestEntry::new(EntryKind::StorageGroup, layout.storage_include()),
            ManifestEntry::new(EntryKind::CompileItem, layout.artifact_include())
                .with_tag("AutoGen", "True")
                .with_tag("DesignTime", "True")
                .with_tag("DependentUpon", layout.mapping_file_name()),
            ManifestEntry::new(EntryKind::NoneItem, layout.mapping_include())
                .with_tag("Generator", GENERATOR_TAG),
        ];
        match self.mode {
            Mode::Configure => per_service.to_vec(),
            Mode::Add => std::iter::once(ManifestEntry::new(
                EntryKind::MetadataGroup,
                layout.folder_include(),
            ))
            .chain(per_service)
            .chain(
                FRAMEWORK_REFERENCES
                    .iter()
                    .map(|assembly| ManifestEntry::new(EntryKind::Reference, *assembly)),
            )
            .collect(),
        }
    }
}
