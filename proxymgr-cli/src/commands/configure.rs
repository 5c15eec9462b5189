//! `proxymgr configure` — edit an existing proxy and regenerate it.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use proxymgr_core::{MappingEdits, Serializer, ServiceName};
use proxymgr_sync::SyncRequest;

use crate::commands::{execute, print_error_json, print_report};
use crate::project::ProjectContext;
use crate::GlobalArgs;

/// Arguments for `proxymgr configure`.
///
/// Options left out keep their persisted value. With none given the proxy
/// is regenerated as it stands.
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Name of the existing proxy.
    #[arg(long)]
    pub name: String,

    /// New metadata address.
    #[arg(long)]
    pub address: Option<String>,

    /// Whether to generate a client class.
    #[arg(long)]
    pub client: Option<bool>,

    /// Serializer for data types: auto, xml, datacontract.
    #[arg(long)]
    pub serializer: Option<Serializer>,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Project file, or a directory holding exactly one.
    pub project: Option<PathBuf>,
}

impl ConfigureArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = ProjectContext::load(self.project.as_deref(), global)?;

        let edits = MappingEdits {
            address: self.address,
            generate_client: self.client,
            serializer: self.serializer,
        };
        if edits.is_empty() {
            tracing::info!("no changes requested; regenerating '{}'", self.name);
        }
        let request = SyncRequest::Configure {
            name: ServiceName::from(self.name.as_str()),
            edits,
        };

        match execute(&ctx, request)? {
            Ok(report) if self.json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
            Ok(report) => {
                print_report("Configured", &report);
                Ok(())
            }
            Err(err) => {
                if self.json {
                    print_error_json(&err)?;
                }
                bail!("configure '{}' did not complete", self.name)
            }
        }
    }
}
