use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed personal task manager CLI.
/// Storage defaults to ~/.daytask/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "dt", version, about = "Personal task management CLI")]
pub struct Cli {
    /// Path to the JSON store file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
