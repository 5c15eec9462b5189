//! Tool configuration.
//!
//! # Resolution order
//!
//! ```text
//! <project-dir>/.proxymgr.yaml        project-local, checked in with the project
//! <home>/.proxymgr/config.yaml         per-user defaults
//! built-in defaults
//! ```
//!
//! The first file found wins; there is no merging between files. Every loader
//! has an `_at(home, …)` form for tests and a convenience form that derives
//! home from `dirs::home_dir()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{config_io_err, ConfigError};
use crate::types::Language;

/// Name of the project-local config file.
pub const PROJECT_CONFIG_FILE: &str = ".proxymgr.yaml";

/// Default storage folder, relative to the project directory.
pub const DEFAULT_FOLDER_NAME: &str = "Service References";

/// Default generator executable, resolved on `PATH`.
pub const DEFAULT_GENERATOR: &str = "svcutil";

/// Default bound on a single generator run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Path or name of the code generator executable.
    pub generator: PathBuf,
    /// Upper bound for one generator run, in seconds.
    pub timeout_secs: u64,
    /// Folder under the project directory holding all proxies.
    pub folder_name: String,
    /// Forces the target language instead of deriving it from the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Argv prefix used to check a read-only file out of version control,
    /// e.g. `["tf", "checkout"]`. The file path is appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_command: Option<Vec<String>>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            generator: PathBuf::from(DEFAULT_GENERATOR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            folder_name: DEFAULT_FOLDER_NAME.to_owned(),
            language: None,
            checkout_command: None,
        }
    }
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<project-dir>/.proxymgr.yaml`. Pure, no I/O.
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_CONFIG_FILE)
}

/// `<home>/.proxymgr/config.yaml`. Pure, no I/O.
pub fn user_config_path_at(home: &Path) -> PathBuf {
    home.join(".proxymgr").join("config.yaml")
}

/// Load configuration for the project in `project_dir`, falling back to the
/// user file under `home`, then to defaults.
pub fn load_at(home: &Path, project_dir: &Path) -> Result<ProxyConfig, ConfigError> {
    for path in [project_config_path(project_dir), user_config_path_at(home)] {
        if path.exists() {
            let config = load_file(&path)?;
            tracing::debug!("using config {}", path.display());
            return Ok(config);
        }
    }
    Ok(ProxyConfig::default())
}

/// `load_at` convenience wrapper.
pub fn load(project_dir: &Path) -> Result<ProxyConfig, ConfigError> {
    load_at(&home()?, project_dir)
}

fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| config_io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(ProxyConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_file_exists() {
        let home = TempDir::new().expect("home");
        let project = TempDir::new().expect("project");
        let config = load_at(home.path(), project.path()).expect("load");
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn project_file_wins_over_user_file() {
        let home = TempDir::new().expect("home");
        let project = TempDir::new().expect("project");
        let user = user_config_path_at(home.path());
        std::fs::create_dir_all(user.parent().unwrap()).unwrap();
        std::fs::write(&user, "generator: /opt/user/svcutil\n").unwrap();
        std::fs::write(
            project_config_path(project.path()),
            "generator: /opt/project/svcutil\ntimeout_secs: 30\n",
        )
        .unwrap();

        let config = load_at(home.path(), project.path()).expect("load");
        assert_eq!(config.generator, PathBuf::from("/opt/project/svcutil"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.folder_name, DEFAULT_FOLDER_NAME);
    }

    #[test]
    fn user_file_used_when_project_has_none() {
        let home = TempDir::new().expect("home");
        let project = TempDir::new().expect("project");
        let user = user_config_path_at(home.path());
        std::fs::create_dir_all(user.parent().unwrap()).unwrap();
        std::fs::write(&user, "language: vb\ncheckout_command: [tf, checkout]\n").unwrap();

        let config = load_at(home.path(), project.path()).expect("load");
        assert_eq!(config.language, Some(Language::VisualBasic));
        assert_eq!(
            config.checkout_command,
            Some(vec!["tf".to_string(), "checkout".to_string()])
        );
    }

    #[test]
    fn malformed_file_reports_path() {
        let home = TempDir::new().expect("home");
        let project = TempDir::new().expect("project");
        std::fs::write(project_config_path(project.path()), "timeout_secs: [not, a, number]\n")
            .unwrap();
        let err = load_at(home.path(), project.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains(PROJECT_CONFIG_FILE));
    }

    #[test]
    fn empty_file_means_defaults() {
        let home = TempDir::new().expect("home");
        let project = TempDir::new().expect("project");
        std::fs::write(project_config_path(project.path()), "\n").unwrap();
        assert_eq!(
            load_at(home.path(), project.path()).expect("load"),
            ProxyConfig::default()
        );
    }
}
