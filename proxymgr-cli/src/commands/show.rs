//! `proxymgr show` — print one proxy's mapping and where its files live.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use proxymgr_core::{store, Serializer};
use proxymgr_manifest::EntryKind;

use crate::project::ProjectContext;
use crate::GlobalArgs;

/// Arguments for `proxymgr show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Proxy name.
    #[arg(long)]
    pub name: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Project file, or a directory holding exactly one.
    pub project: Option<PathBuf>,
}

#[derive(Serialize)]
struct ShowJson {
    name: String,
    address: String,
    generate_client: bool,
    serializer: Serializer,
    mapping_path: PathBuf,
    artifact_path: PathBuf,
    artifact_exists: bool,
    in_project: bool,
}

impl ShowArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = ProjectContext::load(self.project.as_deref(), global)?;
        let layout = ctx.layout(&self.name)?;

        let mapping_path = layout.mapping_path();
        let mapping = store::load(&mapping_path)
            .with_context(|| format!("no proxy named '{}' in this project", self.name))?;
        let artifact_path = layout.artifact_path();
        let in_project = proxymgr_manifest::contains(
            &ctx.target.manifest_path,
            EntryKind::StorageGroup,
            &layout.storage_include(),
        )
        .with_context(|| format!("failed to read {}", ctx.target.manifest_path.display()))?;

        let view = ShowJson {
            name: mapping.name.0,
            address: mapping.address,
            generate_client: mapping.generate_client,
            serializer: mapping.serializer,
            artifact_exists: artifact_path.exists(),
            mapping_path,
            artifact_path,
            in_project,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }

        println!("{}", view.name.bold());
        println!("  address:     {}", view.address);
        println!("  client:      {}", if view.generate_client { "yes" } else { "no" });
        println!("  serializer:  {}", view.serializer);
        println!("  mapping:     {}", view.mapping_path.display());
        let artifact_note = if view.artifact_exists {
            String::new()
        } else {
            format!(" {}", "(missing)".yellow())
        };
        println!("  source:      {}{artifact_note}", view.artifact_path.display());
        if view.in_project {
            println!("  project:     {}", "referenced".green());
        } else {
            println!("  project:     {}", "not referenced".yellow());
        }
        Ok(())
    }
}
