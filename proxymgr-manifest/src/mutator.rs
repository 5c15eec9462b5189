//! Idempotent manifest upserts.
//!
//! ## `upsert` write protocol
//!
//! 1. Read and parse the manifest.
//! 2. Apply every entry to the in-memory document.
//! 3. SHA-256 hash the rendered document and the on-disk bytes.
//! 4. Identical hashes → skip the write.
//! 5. Write to `<path>.proxymgr.tmp`, then rename over the manifest.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use similar::TextDiff;

use crate::document::Document;
use crate::entry::{EntryKind, ManifestEntry};
use crate::error::{io_err, ManifestError};

/// Outcome of one [`upsert`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The manifest changed and was rewritten.
    Written { path: PathBuf },
    /// Every entry was already present with the same tags.
    Unchanged { path: PathBuf },
}

impl UpsertOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, UpsertOutcome::Written { .. })
    }
}

/// What an upsert would change, as a unified diff. Empty when nothing would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPlan {
    pub path: PathBuf,
    pub unified_diff: String,
}

impl ManifestPlan {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Apply `entries` to manifest text and return the new text.
pub fn apply(source: &str, entries: &[ManifestEntry]) -> Result<String, String> {
    let mut document = Document::parse(source)?;
    for entry in entries {
        document.upsert(entry)?;
    }
    Ok(document.render())
}

/// Upsert `entries` into the manifest at `path`, writing at most once.
pub fn upsert(path: &Path, entries: &[ManifestEntry]) -> Result<UpsertOutcome, ManifestError> {
    let current = read(path)?;
    let rendered = apply(&current, entries).map_err(|message| parse_err(path, message))?;

    if digest(current.as_bytes()) == digest(rendered.as_bytes()) {
        tracing::debug!("manifest unchanged: {}", path.display());
        return Ok(UpsertOutcome::Unchanged {
            path: path.to_path_buf(),
        });
    }

    let tmp = PathBuf::from(format!("{}.proxymgr.tmp", path.display()));
    let written = std::fs::write(&tmp, &rendered)
        .map_err(|e| io_err(&tmp, e))
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| io_err(path, e)));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    tracing::info!("updated manifest {} ({} entries)", path.display(), entries.len());
    Ok(UpsertOutcome::Written {
        path: path.to_path_buf(),
    })
}

/// Render what [`upsert`] would write and diff it against the file. No files
/// are written.
pub fn plan(path: &Path, entries: &[ManifestEntry]) -> Result<ManifestPlan, ManifestError> {
    let current = read(path)?;
    let rendered = apply(&current, entries).map_err(|message| parse_err(path, message))?;

    let unified_diff = if current == rendered {
        String::new()
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        TextDiff::from_lines(&current, &rendered)
            .unified_diff()
            .header(&format!("a/{name}"), &format!("b/{name}"))
            .context_radius(3)
            .to_string()
    };
    Ok(ManifestPlan {
        path: path.to_path_buf(),
        unified_diff,
    })
}

/// Whether the manifest at `path` already holds an item of `kind` for
/// `include`.
pub fn contains(path: &Path, kind: EntryKind, include: &str) -> Result<bool, ManifestError> {
    let current = read(path)?;
    let document = Document::parse(&current).map_err(|message| parse_err(path, message))?;
    Ok(document.contains(kind, include))
}

fn read(path: &Path) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).map_err(|e| io_err(path, e))
}

fn parse_err(path: &Path, message: String) -> ManifestError {
    ManifestError::Parse {
        path: path.to_path_buf(),
        message,
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROJECT: &str = "<Project>\n  <ItemGroup>\n    <Compile Include=\"Program.cs\" />\n  </ItemGroup>\n</Project>\n";

    fn reference(name: &str) -> ManifestEntry {
        ManifestEntry::new(EntryKind::Reference, name)
    }

    fn project(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("App.csproj");
        std::fs::write(&path, PROJECT).unwrap();
        path
    }

    #[test]
    fn first_upsert_writes_second_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir);
        let entries = [reference("System.ServiceModel")];

        assert!(upsert(&path, &entries).unwrap().is_written());
        let once = std::fs::read(&path).unwrap();
        let second = upsert(&path, &entries).unwrap();
        assert!(matches!(second, UpsertOutcome::Unchanged { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), once);
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir);
        upsert(&path, &[reference("System.ServiceModel")]).unwrap();
        let tmp = PathBuf::from(format!("{}.proxymgr.tmp", path.display()));
        assert!(!tmp.exists(), ".proxymgr.tmp must be cleaned up");
    }

    #[test]
    fn plan_shows_additions_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir);

        let plan = plan(&path, &[reference("System.ServiceModel")]).unwrap();
        assert!(plan.unified_diff.contains("--- a/App.csproj"));
        assert!(plan.unified_diff.contains("+++ b/App.csproj"));
        assert!(plan
            .unified_diff
            .contains("+    <Reference Include=\"System.ServiceModel\" />"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PROJECT);
    }

    #[test]
    fn plan_is_empty_when_up_to_date() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir);
        let plan = plan(&path, &[ManifestEntry::new(EntryKind::CompileItem, "program.cs")]).unwrap();
        assert!(plan.is_empty(), "{}", plan.unified_diff);
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_removes_tmp_and_keeps_manifest() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir);
        let tmp = dir.path().join("App.csproj.proxymgr.tmp");
        std::os::unix::fs::symlink(dir.path().join("missing").join("target"), &tmp).unwrap();

        let err = upsert(&path, &[reference("System.ServiceModel")]).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
        assert!(std::fs::symlink_metadata(&tmp).is_err(), ".tmp must be gone");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PROJECT);
    }

    #[test]
    fn missing_manifest_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = upsert(&dir.path().join("Nope.csproj"), &[reference("System")]).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
    }

    #[test]
    fn malformed_manifest_is_parse_error_and_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Broken.csproj");
        std::fs::write(&path, "<Project><ItemGroup></Project>").unwrap();
        let err = upsert(&path, &[reference("System")]).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }), "got: {err}");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<Project><ItemGroup></Project>"
        );
    }

    #[test]
    fn contains_reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir);
        assert!(contains(&path, EntryKind::CompileItem, "PROGRAM.CS").unwrap());
        assert!(!contains(&path, EntryKind::NoneItem, "Program.cs").unwrap());
    }
}
