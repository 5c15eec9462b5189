//! Mapping-store error reporting and atomic-write safety.

use assert_fs::prelude::*;
use predicates::prelude::*;
use proxymgr_core::{store, ServiceMapping, StoreError};

#[test]
fn corrupt_record_reports_path_and_reason() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("Input").child("Input.svcmap");
    file.write_str("<ProxyInfo><Name>Input").expect("write");

    let err = store::load(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, StoreError::NotFound { .. }), "got: {msg}");
    assert!(msg.contains("Input.svcmap"), "must contain file path, got: {msg}");
}

#[test]
fn save_creates_storage_folder() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("Service References").child("Input").child("Input.svcmap");

    store::save(file.path(), &ServiceMapping::new("Input", "https://svc/Input.svc"))
        .expect("save");

    file.assert(predicate::path::exists());
    file.assert(predicate::str::contains("<Name>Input</Name>"));
    dir.child("Service References")
        .child("Input")
        .child("Input.svcmap.tmp")
        .assert(predicate::path::missing());
}

#[test]
#[cfg(unix)]
fn failed_save_keeps_previous_record() {
    use std::os::unix::fs::PermissionsExt;

    let dir = assert_fs::TempDir::new().expect("tempdir");
    let folder = dir.child("Input");
    folder.create_dir_all().expect("mkdir");
    let file = folder.child("Input.svcmap");
    let original = ServiceMapping::new("Input", "https://old/Input.svc");
    store::save(file.path(), &original).expect("save");

    std::fs::set_permissions(folder.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
    let result = store::save(file.path(), &ServiceMapping::new("Input", "https://new/Input.svc"));
    std::fs::set_permissions(folder.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

    // Running as root bypasses directory permissions; only assert when the write was refused.
    if result.is_err() {
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store::load(file.path()).expect("load"), original);
    }
}
