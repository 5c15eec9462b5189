//! `proxymgr plan` — show the project-file diff a sync would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use proxymgr_core::Mode;
use proxymgr_sync::ProjectHost;

use crate::project::{service_name, ProjectContext};
use crate::GlobalArgs;

/// Arguments for `proxymgr plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Proxy name.
    #[arg(long)]
    pub name: String,

    /// Project file, or a directory holding exactly one.
    pub project: Option<PathBuf>,
}

impl PlanArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = ProjectContext::load(self.project.as_deref(), global)?;
        let name = service_name(&self.name)?;

        let mode = if ctx.host().find_reference_group(&name) {
            Mode::Configure
        } else {
            Mode::Add
        };
        let entries = ctx.target.context(name, mode).manifest_entries();
        let plan = proxymgr_manifest::plan(&ctx.target.manifest_path, &entries)
            .with_context(|| format!("plan failed for '{}'", self.name))?;

        if plan.is_empty() {
            println!("No manifest changes for '{}' ({mode}).", self.name);
            return Ok(());
        }

        print!("{}", plan.unified_diff);
        if !plan.unified_diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
