//! Terminal implementation of the project host.
//!
//! Reference groups are looked up in the manifest on disk. Save and reload
//! are no-ops because the synchronizer writes the manifest itself.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use colored::Colorize;

use proxymgr_core::ServiceName;
use proxymgr_manifest::EntryKind;
use proxymgr_sync::{host_io_err, HostError, ProjectHost, ProjectTarget};

#[derive(Debug, Clone)]
pub struct ConsoleHost {
    manifest_path: PathBuf,
    folder_name: String,
    checkout_command: Option<Vec<String>>,
}

impl ConsoleHost {
    pub fn new(target: &ProjectTarget, checkout_command: Option<Vec<String>>) -> Self {
        Self {
            manifest_path: target.manifest_path.clone(),
            folder_name: target.folder_name.clone(),
            checkout_command,
        }
    }
}

impl ProjectHost for ConsoleHost {
    fn find_reference_group(&self, name: &ServiceName) -> bool {
        let include = format!("{}\\{}\\", self.folder_name, name);
        match proxymgr_manifest::contains(&self.manifest_path, EntryKind::StorageGroup, &include) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("cannot inspect {}: {e}", self.manifest_path.display());
                false
            }
        }
    }

    fn checkout(&self, path: &Path) -> Result<(), HostError> {
        let Some((program, args)) = self
            .checkout_command
            .as_deref()
            .and_then(|argv| argv.split_first())
        else {
            return Err(HostError::Other(format!(
                "{} is read-only and no checkout_command is configured",
                path.display()
            )));
        };

        let status = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| host_io_err(program, e))?;
        if !status.success() {
            return Err(HostError::Checkout {
                path: path.to_path_buf(),
                message: format!("`{program}` exited with {status}"),
            });
        }
        Ok(())
    }

    fn save(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn reload(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn select_node(&self, path: &Path) -> Result<(), HostError> {
        tracing::debug!("reference group at {}", path.display());
        Ok(())
    }

    fn show_error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.trim_end());
    }

    fn show_warning(&self, message: &str) {
        for line in message.trim_end().lines() {
            eprintln!("{} {}", "!".yellow().bold(), line);
        }
    }
}
