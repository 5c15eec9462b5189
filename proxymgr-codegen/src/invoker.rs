//! External code generator invocation.
//!
//! The generator is launched once per call with a fixed argument template:
//!
//! ```text
//! [/sc] <address> /out:<output> /l:<ext> /ser:<serializer> /n:*,<namespace>
//! ```
//!
//! `/sc` (service contract only) is passed when client generation is off.
//! Standard output is discarded; standard error is captured and becomes
//! either the failure message (non-zero exit) or a warning (zero exit).

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use proxymgr_core::{Language, Serializer};

use crate::error::{io_err, GenerationError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything one generator run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Generator executable.
    pub tool: PathBuf,
    /// Service description address.
    pub address: String,
    /// Generated source file.
    pub output: PathBuf,
    pub language: Language,
    pub serializer: Serializer,
    pub generate_client: bool,
    /// Target namespace, `<project>.<service>`.
    pub namespace: String,
    /// Upper bound on the run; the child is killed when exceeded.
    pub timeout: Duration,
}

/// A successful run. `warnings` holds non-empty diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub exit_code: i32,
    pub warnings: Option<String>,
}

/// Produces a proxy source file from a service description.
///
/// Implementations are stateless per call; the orchestrator owns retries.
pub trait CodeGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, GenerationError>;
}

impl<T: CodeGenerator + ?Sized> CodeGenerator for &T {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        (**self).generate(request)
    }
}

impl<T: CodeGenerator + ?Sized> CodeGenerator for std::sync::Arc<T> {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        (**self).generate(request)
    }
}

/// Runs the generator as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessGenerator {
    cancel: CancellationToken,
}

impl ProcessGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose running child is killed when `cancel` fires.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl CodeGenerator for ProcessGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        run(request, &self.cancel)
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Argument vector for a request, one element per switch.
pub fn build_arguments(request: &GenerationRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    if !request.generate_client {
        args.push("/sc".to_owned());
    }
    args.push(request.address.clone());
    args.push(format!("/out:{}", request.output.display()));
    args.push(format!("/l:{}", request.language.extension()));
    args.push(format!("/ser:{}", request.serializer.generator_arg()));
    args.push(format!("/n:*,{}", request.namespace));
    args
}

/// `<project>.<service>` with every segment made a valid identifier.
pub fn namespace_for(project: &str, service: &str) -> String {
    [project, service]
        .iter()
        .flat_map(|part| part.split('.'))
        .filter(|segment| !segment.is_empty())
        .map(identifier)
        .collect::<Vec<_>>()
        .join(".")
}

fn identifier(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the generator once and wait for it, bounded by `request.timeout` and
/// `cancel`.
pub fn run(
    request: &GenerationRequest,
    cancel: &CancellationToken,
) -> Result<GenerationOutcome, GenerationError> {
    if cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }
    if let Some(parent) = request.output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let args = build_arguments(request);
    tracing::debug!("running {} {}", request.tool.display(), args.join(" "));

    let mut command = Command::new(&request.tool);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    // Own process group, so a wrapper's children go down with it.
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut command, 0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GenerationError::ToolNotFound {
                tool: request.tool.clone(),
            })
        }
        Err(source) => {
            return Err(GenerationError::Spawn {
                tool: request.tool.clone(),
                source,
            })
        }
    };

    let stderr = match child.stderr.take() {
        Some(stderr) => stderr,
        None => {
            kill_tree(&mut child);
            return Err(io_err(
                &request.tool,
                std::io::Error::other("missing stderr pipe"),
            ));
        }
    };
    let (stderr_tx, stderr_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut buf);
        let _ = stderr_tx.send(buf);
    });

    let started = Instant::now();
    let stop_reason = |started: Instant| {
        if cancel.is_cancelled() {
            Some(GenerationError::Cancelled)
        } else if started.elapsed() > request.timeout {
            Some(GenerationError::TimedOut {
                timeout: request.timeout,
            })
        } else {
            None
        }
    };

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let Some(err) = stop_reason(started) {
                    kill_tree(&mut child);
                    let _ = child.wait();
                    tracing::warn!("code generator stopped: {err}");
                    return Err(err);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill_tree(&mut child);
                return Err(io_err(&request.tool, e));
            }
        }
    };

    // A process the tool left behind can keep stderr open after it exits.
    let diagnostic = loop {
        match stderr_rx.recv_timeout(POLL_INTERVAL) {
            Ok(buf) => break buf,
            Err(RecvTimeoutError::Disconnected) => break String::new(),
            Err(RecvTimeoutError::Timeout) => {
                if let Some(err) = stop_reason(started) {
                    kill_tree(&mut child);
                    tracing::warn!("code generator output still open: {err}");
                    return Err(err);
                }
            }
        }
    };

    if !status.success() {
        tracing::error!(
            "code generator failed ({}) with arguments: {}",
            status,
            args.join(" ")
        );
        return Err(GenerationError::NonZeroExit {
            exit_code: status.code(),
            diagnostic,
        });
    }

    let warnings = if diagnostic.trim().is_empty() {
        tracing::info!("code generation completed for {}", display_name(&request.output));
        None
    } else {
        tracing::warn!("code generation completed with warnings");
        Some(diagnostic.trim_end().to_owned())
    };
    Ok(GenerationOutcome {
        exit_code: status.code().unwrap_or(0),
        warnings,
    })
}

/// Kill the child and everything in its process group.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request() -> GenerationRequest {
        GenerationRequest {
            tool: PathBuf::from("svcutil"),
            address: "https://svc/Input.svc".into(),
            output: PathBuf::from("/work/App/Service References/Input/Input.proxy.cs"),
            language: Language::CSharp,
            serializer: Serializer::Auto,
            generate_client: false,
            namespace: "App.Input".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn contract_only_arguments() {
        assert_eq!(
            build_arguments(&request()),
            vec![
                "/sc",
                "https://svc/Input.svc",
                "/out:/work/App/Service References/Input/Input.proxy.cs",
                "/l:cs",
                "/ser:Auto",
                "/n:*,App.Input",
            ]
        );
    }

    #[test]
    fn client_arguments_drop_contract_switch() {
        let req = GenerationRequest {
            generate_client: true,
            serializer: Serializer::DataContract,
            language: Language::VisualBasic,
            ..request()
        };
        let args = build_arguments(&req);
        assert_eq!(args[0], "https://svc/Input.svc");
        assert!(args.contains(&"/ser:DataContractSerializer".to_string()));
        assert!(args.contains(&"/l:vb".to_string()));
        assert!(!args.contains(&"/sc".to_string()));
    }

    #[rstest]
    #[case("MySampleApp", "Input", "MySampleApp.Input")]
    #[case("My-App.Web", "2Billing", "My_App.Web._2Billing")]
    #[case("Sample App", "Orders.V2", "Sample_App.Orders.V2")]
    #[case("App.", ".Input", "App.Input")]
    fn namespace_segments_become_identifiers(
        #[case] project: &str,
        #[case] service: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(namespace_for(project, service), expected);
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = run(&request(), &cancel).unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
    }
}
