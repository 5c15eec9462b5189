//! `proxymgr list` — every proxy with a readable mapping in the project.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use proxymgr_core::{layout, store, Serializer};

use crate::project::ProjectContext;
use crate::GlobalArgs;

/// Arguments for `proxymgr list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Project file, or a directory holding exactly one.
    pub project: Option<PathBuf>,
}

#[derive(Serialize)]
struct ProxyJson {
    name: String,
    address: String,
    generate_client: bool,
    serializer: Serializer,
    mapping_path: PathBuf,
}

#[derive(Tabled)]
struct ProxyRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "address")]
    address: String,
    #[tabled(rename = "serializer")]
    serializer: String,
    #[tabled(rename = "client")]
    client: String,
}

impl ListArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = ProjectContext::load(self.project.as_deref(), global)?;
        let root = layout::storage_root(&ctx.target.project_dir(), &ctx.target.folder_name);
        let proxies = store::list(&root)
            .with_context(|| format!("failed to list proxies under {}", root.display()))?;

        if self.json {
            let rows: Vec<ProxyJson> = proxies
                .into_iter()
                .map(|(path, mapping)| ProxyJson {
                    name: mapping.name.0,
                    address: mapping.address,
                    generate_client: mapping.generate_client,
                    serializer: mapping.serializer,
                    mapping_path: path,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        if proxies.is_empty() {
            println!("No proxies under {}.", root.display());
            return Ok(());
        }

        let rows: Vec<ProxyRow> = proxies
            .into_iter()
            .map(|(_, mapping)| ProxyRow {
                name: mapping.name.0,
                address: mapping.address,
                serializer: mapping.serializer.to_string(),
                client: if mapping.generate_client { "yes" } else { "no" }.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
