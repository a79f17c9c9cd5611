//! # goalboard
//!
//! Command-line front end over the goalboard core.
//!
//! - `goalboard register` — create a user account
//! - `goalboard goal add/list/show/update/delete` — manage goals
//! - `goalboard subtask add/update/toggle/delete` — manage a goal's subtasks
//! - `goalboard stats` — dashboard counters
//! - `goalboard suggest` — subtask suggestions for a description
//!
//! Output is pretty-printed JSON on stdout.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use goalboard_core::{init_from_config, open_store, AppConfig};

/// Goal and subtask dashboard.
#[derive(Parser)]
#[command(name = "goalboard", version, about)]
struct Cli {
    /// SQLite database file. Overrides GOALBOARD_DB_PATH.
    ///
    /// When unset, an in-memory store is used that starts empty on every run,
    /// so users registered in one invocation are gone in the next.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for log files. Overrides GOALBOARD_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Email of the acting user.
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user.
    Register {
        email: String,
        /// Opaque credential hash produced by the auth layer.
        #[arg(long)]
        password_hash: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Manage subtasks of a goal.
    Subtask {
        #[command(subcommand)]
        command: commands::subtask::SubtaskCommands,
    },
    /// Show dashboard counters for the owner.
    Stats,
    /// Suggest subtasks for a description.
    Suggest(commands::suggest::SuggestArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("invalid environment configuration")?;
    if cli.db.is_some() {
        config.database_path = cli.db.clone();
    }
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir.clone();
    }
    init_from_config(&config).map_err(anyhow::Error::msg)?;

    let store = open_store(&config).context("failed to open goal store")?;
    let app = commands::App::new(store, &config);
    let owner = cli.owner.as_deref();

    match &cli.command {
        Commands::Register {
            email,
            password_hash,
            first_name,
            last_name,
        } => commands::register(&app, email, password_hash, first_name, last_name.as_deref()),
        Commands::Goal { command } => commands::goal::execute(command, &app, owner),
        Commands::Subtask { command } => commands::subtask::execute(command, &app, owner),
        Commands::Stats => commands::stats(&app, owner),
        Commands::Suggest(args) => commands::suggest::execute(args, &app, owner),
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;

    #[test]
    fn subtask_commands_include_update() {
        let cli = Cli::command();
        cli.clone().debug_assert();
        let subtask = cli.find_subcommand("subtask").unwrap();
        let names: Vec<&str> = subtask.get_subcommands().map(|cmd| cmd.get_name()).collect();
        assert_eq!(names, vec!["add", "update", "toggle", "delete"]);
    }

    #[test]
    fn db_help_warns_that_memory_store_is_per_run() {
        let cli = Cli::command();
        let db = cli.get_arguments().find(|arg| arg.get_id() == "db").unwrap();
        let help = db.get_long_help().map(ToString::to_string).unwrap_or_default();
        assert!(help.contains("starts empty on every run"), "{help}");
    }
}
