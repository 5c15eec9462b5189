//! proxymgr — generate and register WCF service proxies in .NET projects.
//!
//! # Usage
//!
//! ```text
//! proxymgr add --name <name> --address <url> [--client] [--serializer auto|xml|datacontract] [PROJECT]
//! proxymgr configure --name <name> [--address <url>] [--client <bool>] [--serializer ...] [PROJECT]
//! proxymgr show --name <name> [--json] [PROJECT]
//! proxymgr list [--json] [PROJECT]
//! proxymgr plan --name <name> [PROJECT]
//! ```
//!
//! `PROJECT` is a `.csproj`/`.vbproj` file or a directory holding exactly one;
//! it defaults to the current directory.

mod commands;
mod host;
mod logging;
mod project;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use commands::{
    add::AddArgs, configure::ConfigureArgs, list::ListArgs, plan::PlanArgs, show::ShowArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "proxymgr",
    version,
    about = "Generate WCF service proxies and keep project files in step",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Proxy generator executable (overrides configuration).
    #[arg(long, global = true, value_name = "PATH")]
    pub generator: Option<PathBuf>,

    /// Generator timeout in seconds (overrides configuration).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Debug logging for proxymgr crates.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new proxy and add it to the project.
    Add(AddArgs),

    /// Change an existing proxy's settings and regenerate it.
    Configure(ConfigureArgs),

    /// Show one proxy's mapping and files.
    Show(ShowArgs),

    /// List the proxies in a project.
    List(ListArgs),

    /// Show the project-file changes a sync of a proxy would make.
    Plan(PlanArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.verbose, cli.global.log_json);

    let global = &cli.global;
    match cli.command {
        Commands::Add(args) => args.run(global),
        Commands::Configure(args) => args.run(global),
        Commands::Show(args) => args.run(global),
        Commands::List(args) => args.run(global),
        Commands::Plan(args) => args.run(global),
    }
}
