//! Locating the project manifest and resolving its configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use proxymgr_core::types::validate_name;
use proxymgr_core::{config, ProxyConfig, ProxyLayout, ServiceName};
use proxymgr_sync::ProjectTarget;

use crate::host::ConsoleHost;
use crate::GlobalArgs;

const MANIFEST_EXTENSIONS: [&str; 2] = ["csproj", "vbproj"];

/// A resolved project: manifest, configuration and the synchronizer target.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub target: ProjectTarget,
    pub config: ProxyConfig,
}

impl ProjectContext {
    /// Resolve `project` (a manifest, a directory, or the current directory)
    /// and load its configuration, with command-line overrides applied.
    pub fn load(project: Option<&Path>, global: &GlobalArgs) -> Result<Self> {
        let manifest = resolve_manifest(project)?;
        let project_dir = match manifest.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut config = config::load(&project_dir)
            .with_context(|| format!("failed to load configuration for {}", manifest.display()))?;
        if let Some(generator) = &global.generator {
            config.generator = generator.clone();
        }
        if let Some(timeout) = global.timeout {
            config.timeout_secs = timeout;
        }

        tracing::debug!(
            "project {} (generator {}, timeout {}s)",
            manifest.display(),
            config.generator.display(),
            config.timeout_secs
        );
        Ok(Self {
            target: ProjectTarget::from_config(manifest, &config),
            config,
        })
    }

    pub fn host(&self) -> ConsoleHost {
        ConsoleHost::new(&self.target, self.config.checkout_command.clone())
    }

    /// Layout for `name`, which must be a valid proxy name.
    pub fn layout(&self, name: &str) -> Result<ProxyLayout> {
        Ok(self.target.layout(service_name(name)?))
    }
}

/// `name` as a proxy name, rejected if it would not stay a single folder
/// under the service references folder.
pub fn service_name(name: &str) -> Result<ServiceName> {
    let name = ServiceName::from(name);
    validate_name(&name)?;
    Ok(name)
}

/// The manifest named by `project`, or the single manifest in that directory
/// (default: the current directory).
pub fn resolve_manifest(project: Option<&Path>) -> Result<PathBuf> {
    let candidate = match project {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("cannot read the current directory")?,
    };
    if candidate.is_file() {
        return Ok(candidate);
    }
    if !candidate.is_dir() {
        bail!("project {} does not exist", candidate.display());
    }

    let mut found: Vec<PathBuf> = std::fs::read_dir(&candidate)
        .with_context(|| format!("cannot list {}", candidate.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_manifest(path))
        .collect();
    found.sort();

    match found.len() {
        0 => bail!(
            "no .csproj or .vbproj found in {}; pass the project file explicitly",
            candidate.display()
        ),
        1 => Ok(found.remove(0)),
        _ => {
            let names: Vec<String> = found
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            bail!(
                "several projects in {}: {}; pass one explicitly",
                candidate.display(),
                names.join(", ")
            )
        }
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            MANIFEST_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
