//! # dt - Personal task management CLI
//!
//! A local-first to-do manager with subtasks, priorities, due dates,
//! dependencies, and a per-day calendar view, backed by a single JSON file.
//!
//! ## Quick start
//!
//! ```bash
//! # Add a task with subtasks and a due date
//! dt add "Prepare launch" --due friday --priority high \
//!     --subtask "Draft announcement" --subtask "Review copy"
//!
//! # List what matters right now
//! dt list --filter focused
//!
//! # Tick off a subtask (completing the last one completes the task)
//! dt check <task-id> <task-id>-0
//!
//! # See the month at a glance
//! dt calendar 12 2024
//! ```
//!
//! Data lives in `~/.daytask/tasks.json`. The file is plain JSON with
//! ISO-8601 dates; point `--db` somewhere else to keep separate lists.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod date;
pub mod db;
pub mod fields;
pub mod query;
pub mod store;
pub mod task;

use cli::Cli;
use cmd::*;
use db::{JsonFileStorage, STORE_FILE_NAME};
use store::TaskStore;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions never touch the store.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let db_path = cli.db.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_dir = PathBuf::from(home).join(".daytask");
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            eprintln!("Failed to create data directory {}: {e}", data_dir.display());
            std::process::exit(1);
        }
        data_dir.join(STORE_FILE_NAME)
    });

    let mut store = TaskStore::open(Box::new(JsonFileStorage::new(db_path)));

    match cli.command {
        Commands::Add {
            title,
            desc,
            priority,
            due,
            recurrence,
            category,
            tag,
            subtask,
            depends_on,
        } => cmd_add(
            &mut store, title, desc, priority, due, recurrence, category, tag, subtask, depends_on,
        ),

        Commands::List {
            filter,
            search,
            sort,
            limit,
        } => cmd_list(&mut store, filter, search, sort, limit),

        Commands::View { id } => cmd_view(&mut store, &id),

        Commands::Update {
            id,
            title,
            desc,
            priority,
            due,
            clear_due,
            recurrence,
            category,
            tag,
            depends_on,
        } => cmd_update(
            &mut store, &id, title, desc, priority, due, clear_due, recurrence, category, tag,
            depends_on,
        ),

        Commands::Toggle { id } => cmd_toggle(&mut store, &id),

        Commands::Check { id, subtask_id } => cmd_check(&mut store, &id, &subtask_id),

        Commands::Delete { id } => cmd_delete(&mut store, &id),

        Commands::Search { query } => cmd_search(&store, &query),

        Commands::Stats => cmd_stats(&store),

        Commands::Upcoming => cmd_upcoming(&store),

        Commands::Overdue => cmd_overdue(&store),

        Commands::Week => cmd_week(&store),

        Commands::Calendar { month, year } => cmd_calendar(&store, month, year),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
