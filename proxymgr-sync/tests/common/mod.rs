#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use proxymgr_codegen::{CodeGenerator, GenerationError, GenerationOutcome, GenerationRequest};
use proxymgr_core::{ProxyConfig, ServiceName};
use proxymgr_sync::{HostError, ProjectHost, ProjectTarget};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
    <Compile Include="Program.cs" />
  </ItemGroup>
</Project>
"#;

pub struct Fixture {
    pub dir: TempDir,
    pub manifest: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let manifest = dir.path().join("MySampleApp.csproj");
        std::fs::write(&manifest, PROJECT).expect("write manifest");
        Self { dir, manifest }
    }

    pub fn target(&self) -> ProjectTarget {
        ProjectTarget::from_config(&self.manifest, &ProxyConfig::default())
    }

    pub fn storage_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join("Service References").join(name)
    }

    pub fn mapping_path(&self, name: &str) -> PathBuf {
        self.storage_dir(name).join(format!("{name}.svcmap"))
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.storage_dir(name).join(format!("{name}.proxy.cs"))
    }

    pub fn manifest_text(&self) -> String {
        std::fs::read_to_string(&self.manifest).expect("read manifest")
    }
}

// ---------------------------------------------------------------------------
// Fake generator
// ---------------------------------------------------------------------------

/// What the fake generator does on one call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Write a source file declaring a service contract interface.
    Contract,
    /// Write a source file with data types only.
    NoContract,
    /// Write a contract and report warnings on the diagnostic stream.
    Warn(&'static str),
    /// Exit non-zero with the given diagnostic.
    Fail(&'static str),
    /// Block until the token is cancelled.
    WaitForCancel(CancellationToken),
}

#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(script: impl IntoIterator<Item = Script>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        self.calls.lock().unwrap().push(request.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Contract);
        match step {
            Script::Contract => {
                write_source(&request.output, &request.namespace, true);
                Ok(success(None))
            }
            Script::NoContract => {
                write_source(&request.output, &request.namespace, false);
                Ok(success(None))
            }
            Script::Warn(text) => {
                write_source(&request.output, &request.namespace, true);
                Ok(success(Some(text.to_owned())))
            }
            Script::Fail(diagnostic) => Err(GenerationError::NonZeroExit {
                exit_code: Some(1),
                diagnostic: diagnostic.to_owned(),
            }),
            Script::WaitForCancel(token) => {
                while !token.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(GenerationError::Cancelled)
            }
        }
    }
}

fn success(warnings: Option<String>) -> GenerationOutcome {
    GenerationOutcome {
        exit_code: 0,
        warnings,
    }
}

fn write_source(path: &Path, namespace: &str, with_contract: bool) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body = if with_contract {
        "    [System.ServiceModel.ServiceContract]\n    public interface IInput\n    {\n        string Echo(string value);\n    }\n"
    } else {
        "    public partial class InputRequest\n    {\n        public string Value { get; set; }\n    }\n"
    };
    std::fs::write(path, format!("namespace {namespace}\n{{\n{body}}}\n")).unwrap();
}

// ---------------------------------------------------------------------------
// Fake host
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeHost {
    pub existing: Vec<ServiceName>,
    pub fail_checkout: bool,
    pub events: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn with_existing(name: &str) -> Self {
        Self {
            existing: vec![ServiceName::from(name)],
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

impl ProjectHost for FakeHost {
    fn find_reference_group(&self, name: &ServiceName) -> bool {
        self.existing.contains(name)
    }

    fn checkout(&self, path: &Path) -> Result<(), HostError> {
        self.record(format!("checkout:{}", file_name(path)));
        if self.fail_checkout {
            return Err(HostError::Checkout {
                path: path.to_path_buf(),
                message: "server unavailable".into(),
            });
        }
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms).unwrap();
        Ok(())
    }

    fn save(&self) -> Result<(), HostError> {
        self.record("save".into());
        Ok(())
    }

    fn reload(&self) -> Result<(), HostError> {
        self.record("reload".into());
        Ok(())
    }

    fn select_node(&self, path: &Path) -> Result<(), HostError> {
        self.record(format!("select:{}", file_name(path)));
        Ok(())
    }

    fn show_error(&self, message: &str) {
        self.record(format!("error:{message}"));
    }

    fn show_warning(&self, message: &str) {
        self.record(format!("warning:{message}"));
    }
}

pub fn set_read_only(path: &Path) {
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(path, perms).unwrap();
}
