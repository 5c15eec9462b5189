//! # proxymgr-sync
//!
//! Keeps a generated service proxy, its mapping record and the project
//! manifest in step.
//!
//! Build an [`Orchestrator`] from a [`CodeGenerator`](proxymgr_codegen::CodeGenerator),
//! a [`ProjectHost`] and a [`ProjectTarget`], then [`Orchestrator::run`] a
//! [`SyncRequest`] directly or hand it to a [`SyncWorker`] to run off the
//! calling thread.

pub mod context;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod worker;

pub use context::{ProjectTarget, WorkflowContext};
pub use error::{host_io_err, HostError, SyncError, WorkerError};
pub use host::ProjectHost;
pub use orchestrator::{GenerationAttempt, Orchestrator, StateKind, SyncReport, SyncRequest};
pub use worker::{SyncHandle, SyncWorker};
