//! Background execution of one synchronization at a time.
//!
//! The workflow blocks on a child process, so it runs on tokio's blocking
//! pool. Callers get a [`SyncHandle`] whose [`wait`](SyncHandle::wait)
//! resolves exactly once with the terminal result. While a run is in flight
//! further [`SyncWorker::start`] calls are refused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use proxymgr_codegen::CodeGenerator;

use crate::error::{SyncError, WorkerError};
use crate::host::ProjectHost;
use crate::orchestrator::{Orchestrator, SyncReport, SyncRequest};

/// Single-flight runner for an [`Orchestrator`].
///
/// `cancel` must be the token the orchestrator's generator watches (see
/// `ProcessGenerator::with_cancellation`). Once cancelled it stays cancelled,
/// so later runs on the same worker fail fast.
pub struct SyncWorker<G, H> {
    orchestrator: Arc<Orchestrator<G, H>>,
    busy: Arc<AtomicBool>,
    cancel: CancellationToken,
}

/// A started run.
#[derive(Debug)]
pub struct SyncHandle {
    result: oneshot::Receiver<Result<SyncReport, SyncError>>,
    cancel: CancellationToken,
}

impl<G, H> SyncWorker<G, H>
where
    G: CodeGenerator + Send + Sync + 'static,
    H: ProjectHost + Send + Sync + 'static,
{
    pub fn new(orchestrator: Orchestrator<G, H>, cancel: CancellationToken) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            busy: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `request` on the blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, request: SyncRequest) -> Result<SyncHandle, WorkerError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("refusing to start '{}': a run is in flight", request.name());
            return Err(WorkerError::Busy);
        }

        let (tx, rx) = oneshot::channel();
        let orchestrator = Arc::clone(&self.orchestrator);
        let guard = BusyGuard(Arc::clone(&self.busy));
        tokio::task::spawn_blocking(move || {
            let result = orchestrator.run(request);
            // Clear the flag before reporting so the caller can start again
            // as soon as `wait` resolves.
            drop(guard);
            let _ = tx.send(result);
        });

        Ok(SyncHandle {
            result: rx,
            cancel: self.cancel.clone(),
        })
    }
}

impl SyncHandle {
    /// Stop the running generator, if any. The run then fails with a
    /// cancelled generation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Terminal result of the run.
    pub async fn wait(self) -> Result<SyncReport, WorkerError> {
        let outcome = self.result.await.map_err(|_| WorkerError::ChannelClosed)?;
        outcome.map_err(WorkerError::from)
    }
}

/// Clears the busy flag when dropped, including on panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
