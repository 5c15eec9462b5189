//! The proxy synchronization workflow.
//!
//! ```text
//! Idle → Validating → CheckingOut → Generating → ValidatingContract
//!      → [RetryGenerating → ValidatingContract] → Persisting
//!      → MutatingManifest → Reloading → Done
//! ```
//!
//! `Failed` is reachable from every state. Each state owns the values
//! produced so far and one transition function turns it into the next.
//! Mapping changes (the serializer fallback) produce a new value rather than
//! mutating the one already held.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use proxymgr_codegen::{has_service_contract, CodeGenerator};
use proxymgr_core::types::validate_name;
use proxymgr_core::{store, MappingEdits, Mode, Serializer, ServiceMapping, ServiceName};

use crate::context::{ProjectTarget, WorkflowContext};
use crate::error::SyncError;
use crate::host::ProjectHost;

// ---------------------------------------------------------------------------
// Requests and reports
// ---------------------------------------------------------------------------

/// What the caller asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    /// Create a new proxy. The name must not already be in use.
    Add(ServiceMapping),
    /// Regenerate an existing proxy after applying `edits` to its mapping.
    Configure {
        name: ServiceName,
        edits: MappingEdits,
    },
}

impl SyncRequest {
    pub fn name(&self) -> &ServiceName {
        match self {
            SyncRequest::Add(mapping) => &mapping.name,
            SyncRequest::Configure { name, .. } => name,
        }
    }
}

/// Workflow states, without their payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateKind {
    Idle,
    Validating,
    CheckingOut,
    Generating,
    ValidatingContract,
    RetryGenerating,
    Persisting,
    MutatingManifest,
    Reloading,
    Done,
    Failed,
}

/// One generator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationAttempt {
    pub serializer: Serializer,
    /// `None` when the generator failed.
    pub exit_code: Option<i32>,
    pub warnings: Option<String>,
}

/// Record of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub name: ServiceName,
    pub mode: Mode,
    pub states: Vec<StateKind>,
    pub attempts: Vec<GenerationAttempt>,
    pub warnings: Vec<String>,
    /// The mapping as persisted, including any serializer fallback.
    pub mapping: ServiceMapping,
    pub mapping_path: PathBuf,
    pub manifest_written: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RunLog {
    states: Vec<StateKind>,
    attempts: Vec<GenerationAttempt>,
    warnings: Vec<String>,
    manifest_written: bool,
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum State {
    Idle(SyncRequest),
    Validating(SyncRequest),
    CheckingOut(Step),
    Generating(Step),
    ValidatingContract { step: Step, retried: bool },
    RetryGenerating(Step),
    Persisting(Step),
    MutatingManifest(Step),
    Reloading(Step),
    Done(Step),
    Failed(SyncError),
}

/// Context plus the mapping as it currently stands.
#[derive(Debug)]
struct Step {
    ctx: WorkflowContext,
    mapping: ServiceMapping,
}

impl State {
    fn kind(&self) -> StateKind {
        match self {
            State::Idle(_) => StateKind::Idle,
            State::Validating(_) => StateKind::Validating,
            State::CheckingOut(_) => StateKind::CheckingOut,
            State::Generating(_) => StateKind::Generating,
            State::ValidatingContract { .. } => StateKind::ValidatingContract,
            State::RetryGenerating(_) => StateKind::RetryGenerating,
            State::Persisting(_) => StateKind::Persisting,
            State::MutatingManifest(_) => StateKind::MutatingManifest,
            State::Reloading(_) => StateKind::Reloading,
            State::Done(_) => StateKind::Done,
            State::Failed(_) => StateKind::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs synchronizations for one project.
#[derive(Debug)]
pub struct Orchestrator<G, H> {
    generator: G,
    host: H,
    target: ProjectTarget,
}

impl<G: CodeGenerator, H: ProjectHost> Orchestrator<G, H> {
    pub fn new(generator: G, host: H, target: ProjectTarget) -> Self {
        Self {
            generator,
            host,
            target,
        }
    }

    pub fn target(&self) -> &ProjectTarget {
        &self.target
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Drive `request` to `Done` or `Failed`.
    ///
    /// Failures are shown through the host before being returned.
    pub fn run(&self, request: SyncRequest) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let name = request.name().clone();
        tracing::info!("synchronizing service reference '{name}'");

        let mut log = RunLog::default();
        let mut state = State::Idle(request);
        loop {
            log.states.push(state.kind());
            state = match state {
                State::Idle(request) => State::Validating(request),
                State::Validating(request) => self.validate(request),
                State::CheckingOut(step) => self.check_out(step),
                State::Generating(step) => self.generate(step, &mut log),
                State::ValidatingContract { step, retried } => {
                    self.validate_contract(step, retried, &mut log)
                }
                State::RetryGenerating(step) => self.retry(step, &mut log),
                State::Persisting(step) => self.persist(step),
                State::MutatingManifest(step) => self.mutate_manifest(step, &mut log),
                State::Reloading(step) => self.reload(step),
                State::Done(step) => {
                    tracing::info!("[OK] service reference '{name}' synchronized");
                    return Ok(SyncReport {
                        name,
                        mode: step.ctx.mode,
                        states: log.states,
                        attempts: log.attempts,
                        warnings: log.warnings,
                        mapping_path: step.ctx.mapping_path(),
                        mapping: step.mapping,
                        manifest_written: log.manifest_written,
                        started_at,
                        finished_at: Utc::now(),
                    });
                }
                State::Failed(err) => {
                    tracing::error!("synchronizing '{name}' failed: {err}");
                    self.host.show_error(&err.to_string());
                    return Err(err);
                }
            };
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn validate(&self, request: SyncRequest) -> State {
        if let Err(e) = validate_name(request.name()) {
            return State::Failed(e.into());
        }
        let (ctx, mapping) = match request {
            SyncRequest::Add(mapping) => {
                if self.host.find_reference_group(&mapping.name) {
                    return State::Failed(SyncError::NameConflict { name: mapping.name });
                }
                (self.target.context(mapping.name.clone(), Mode::Add), mapping)
            }
            SyncRequest::Configure { name, edits } => {
                let ctx = self.target.context(name.clone(), Mode::Configure);
                match store::load(&ctx.mapping_path()) {
                    Ok(stored) => {
                        let mapping = edits.apply(stored);
                        (ctx, mapping)
                    }
                    Err(source) => return State::Failed(SyncError::MappingMissing { name, source }),
                }
            }
        };
        if let Err(e) = mapping.validate() {
            return State::Failed(e.into());
        }
        tracing::debug!("mode {} for '{}'", ctx.mode, mapping.name);
        State::CheckingOut(Step { ctx, mapping })
    }

    fn check_out(&self, step: Step) -> State {
        for path in [step.ctx.mapping_path(), step.ctx.artifact_path()] {
            if !is_read_only(&path) {
                continue;
            }
            match self.host.checkout(&path) {
                Ok(()) => tracing::debug!("checked out {}", path.display()),
                Err(e) => tracing::warn!("checkout of {} failed: {e}", path.display()),
            }
        }
        State::Generating(step)
    }

    fn generate(&self, step: Step, log: &mut RunLog) -> State {
        let serializer = step.mapping.serializer;
        match self.invoke(&step, serializer, log) {
            Ok(()) => State::ValidatingContract {
                step,
                retried: false,
            },
            Err(err) => State::Failed(err),
        }
    }

    fn validate_contract(&self, step: Step, retried: bool, log: &mut RunLog) -> State {
        let artifact = step.ctx.artifact_path();
        if has_service_contract(&artifact) {
            tracing::info!("[OK] service contract found in {}", artifact.display());
            return State::Persisting(step);
        }
        if retried || step.mapping.serializer == Serializer::XmlSerializer {
            tracing::warn!("no service contract found in {}", artifact.display());
            return State::Persisting(step);
        }

        let warning = format!(
            "no service contract generated with the {} serializer; falling back to XmlSerializer",
            step.mapping.serializer
        );
        tracing::warn!("{warning}");
        self.host.show_warning(&warning);
        log.warnings.push(warning);
        State::RetryGenerating(Step {
            mapping: step.mapping.with_serializer(Serializer::XmlSerializer),
            ctx: step.ctx,
        })
    }

    fn retry(&self, step: Step, log: &mut RunLog) -> State {
        match self.invoke(&step, Serializer::XmlSerializer, log) {
            Ok(()) => State::ValidatingContract {
                step,
                retried: true,
            },
            Err(err) => State::Failed(err),
        }
    }

    fn persist(&self, step: Step) -> State {
        match store::save(&step.ctx.mapping_path(), &step.mapping) {
            Ok(()) => {
                tracing::info!("[OK] mapping saved to {}", step.ctx.mapping_path().display());
                State::MutatingManifest(step)
            }
            Err(e) => State::Failed(SyncError::PersistFailed(e)),
        }
    }

    fn mutate_manifest(&self, step: Step, log: &mut RunLog) -> State {
        let entries = step.ctx.manifest_entries();
        match proxymgr_manifest::upsert(&step.ctx.manifest_path, &entries) {
            Ok(outcome) => {
                log.manifest_written = outcome.is_written();
                tracing::info!("[OK] project manifest up to date");
                State::Reloading(step)
            }
            Err(e) => State::Failed(SyncError::ManifestMutationFailed(e)),
        }
    }

    fn reload(&self, step: Step) -> State {
        if let Err(e) = self.host.save() {
            tracing::warn!("saving the project failed: {e}");
        }
        if let Err(e) = self.host.reload() {
            tracing::warn!("reloading the project failed: {e}");
        }
        if let Err(e) = self.host.select_node(&step.ctx.layout.storage_dir()) {
            tracing::debug!("selecting the reference group failed: {e}");
        }
        State::Done(step)
    }

    /// One generator call, recorded in `log`; warnings go to the host.
    fn invoke(&self, step: &Step, serializer: Serializer, log: &mut RunLog) -> Result<(), SyncError> {
        let request = step.ctx.generation_request(
            &step.mapping,
            serializer,
            &self.target.generator,
            self.target.timeout,
        );
        match self.generator.generate(&request) {
            Ok(outcome) => {
                tracing::info!("[OK] generated {} with {serializer}", request.output.display());
                if let Some(warnings) = &outcome.warnings {
                    self.host.show_warning(warnings);
                    log.warnings.push(warnings.clone());
                }
                log.attempts.push(GenerationAttempt {
                    serializer,
                    exit_code: Some(outcome.exit_code),
                    warnings: outcome.warnings,
                });
                Ok(())
            }
            Err(e) => {
                log.attempts.push(GenerationAttempt {
                    serializer,
                    exit_code: None,
                    warnings: None,
                });
                Err(SyncError::GenerationFailed(e))
            }
        }
    }
}

fn is_read_only(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(false)
}
