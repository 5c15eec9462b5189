//! `proxymgr add` — create a service proxy in a project.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use proxymgr_core::{Serializer, ServiceMapping};
use proxymgr_sync::SyncRequest;

use crate::commands::{execute, print_error_json, print_report};
use crate::project::ProjectContext;
use crate::GlobalArgs;

/// Arguments for `proxymgr add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Proxy name; becomes the folder under the service references folder.
    #[arg(long)]
    pub name: String,

    /// Absolute metadata address of the service.
    #[arg(long)]
    pub address: String,

    /// Also generate a client class.
    #[arg(long)]
    pub client: bool,

    /// Serializer for data types: auto, xml, datacontract.
    #[arg(long, default_value = "auto")]
    pub serializer: Serializer,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Project file, or a directory holding exactly one.
    pub project: Option<PathBuf>,
}

impl AddArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = ProjectContext::load(self.project.as_deref(), global)?;

        let mut mapping = ServiceMapping::new(self.name.as_str(), self.address.as_str())
            .with_serializer(self.serializer);
        mapping.generate_client = self.client;

        match execute(&ctx, SyncRequest::Add(mapping))? {
            Ok(report) if self.json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
            Ok(report) => {
                print_report("Added", &report);
                Ok(())
            }
            Err(err) => {
                if self.json {
                    print_error_json(&err)?;
                }
                bail!("add '{}' did not complete", self.name)
            }
        }
    }
}
