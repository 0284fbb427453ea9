//! The `signpost` binary.
//!
//! ```text
//! signpost build [--root DIR] [--base-path P] [--base-url URL] [--query-cache]
//! signpost dev   [--root DIR] [--base-path P] [--base-url URL] [--query-cache]
//! ```
//!
//! Flags override `signpost.toml`, `.env` and `SIGNPOST__*` variables.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "signpost", version, about = "Typed client generation for file-based API routes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate signpost_client.rs once
    Build(BuildArgs),
    /// Generate, then regenerate whenever a route.rs changes
    Dev(BuildArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct BuildArgs {
    /// Project root containing app/ or src/app/
    #[arg(long, env = "SIGNPOST_ROOT")]
    root: Option<PathBuf>,

    /// Prefix for every generated URL (e.g. /api)
    #[arg(long)]
    base_path: Option<String>,

    /// Fixed origin for generated calls (e.g. https://api.example.com)
    #[arg(long)]
    base_url: Option<String>,

    /// Also generate query and mutation wrappers
    #[arg(long)]
    query_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => commands::build(&args),
        Command::Dev(args) => commands::dev(&args).await,
    }
}
