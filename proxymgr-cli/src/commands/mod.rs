pub mod add;
pub mod configure;
pub mod list;
pub mod plan;
pub mod show;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use proxymgr_codegen::ProcessGenerator;
use proxymgr_sync::{Orchestrator, SyncError, SyncReport, SyncRequest, SyncWorker, WorkerError};

use crate::project::ProjectContext;

/// Run `request` to completion on a background worker. Ctrl-C cancels the
/// generator and waits for the run to unwind.
///
/// The outer error covers the runtime and the worker itself; the inner one is
/// the workflow's own failure, already shown to the user by the host.
pub fn execute(ctx: &ProjectContext, request: SyncRequest) -> Result<Result<SyncReport, SyncError>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result: Result<SyncReport, WorkerError> = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let orchestrator = Orchestrator::new(
            ProcessGenerator::with_cancellation(cancel.clone()),
            ctx.host(),
            ctx.target.clone(),
        );
        let worker = SyncWorker::new(orchestrator, cancel);

        let handle = worker.start(request)?;
        let token = handle.cancellation_token();
        let wait = handle.wait();
        tokio::pin!(wait);

        let finished = tokio::select! {
            result = &mut wait => Some(result),
            Ok(()) = tokio::signal::ctrl_c() => None,
        };
        match finished {
            Some(result) => result,
            None => {
                eprintln!("{} interrupted, stopping the generator", "!".yellow().bold());
                token.cancel();
                wait.await
            }
        }
    });

    match result {
        Ok(report) => Ok(Ok(report)),
        Err(WorkerError::Sync(err)) => Ok(Err(err)),
        Err(other) => Err(other).context("synchronization worker failed"),
    }
}

#[derive(Serialize)]
struct ErrorJson<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: String,
}

/// `{"error": {"kind": ..., "message": ...}}` on stdout.
pub fn print_error_json(err: &SyncError) -> Result<()> {
    let body = ErrorJson {
        error: ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Human summary of a completed run.
pub fn print_report(verb: &str, report: &SyncReport) {
    let mapping = &report.mapping;
    println!(
        "{} {} '{}' ({})",
        "✓".green().bold(),
        verb,
        report.name,
        mapping.serializer
    );
    println!("  address:  {}", mapping.address);
    println!("  mapping:  {}", report.mapping_path.display());
    if report.attempts.len() > 1 {
        println!(
            "  {} retried with {} after the first output declared no service contract",
            "✎".cyan(),
            mapping.serializer
        );
    }
    if report.manifest_written {
        println!("  {} project file updated", "✎".cyan());
    } else {
        println!("  {} project file already up to date", "·".dimmed());
    }
    let elapsed: chrono::Duration = report.finished_at - report.started_at;
    println!(
        "  {}",
        format!("finished in {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0).dimmed()
    );
}
