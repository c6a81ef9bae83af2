//! HighPoint HouseKeep - command-line front end to the facility dashboard.

mod commands;
mod context;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use facility_config::{init_logging, Config, Paths};

use crate::commands::{InventoryAction, TaskAction};
use crate::context::{Credentials, Endpoints};

/// HighPoint HouseKeep command-line interface.
#[derive(Parser)]
#[command(name = "highpoint")]
#[command(about = "Facility management for HighPoint residence")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.highpoint
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Sign in as this account before running the command
    #[arg(long, env = "HIGHPOINT_EMAIL", global = true)]
    email: Option<String>,

    #[arg(long, env = "HIGHPOINT_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Store emulator host, e.g. http://localhost:8080
    #[arg(long, global = true)]
    emulator: Option<String>,

    /// Sign-in emulator host, e.g. http://localhost:9099
    #[arg(long, global = true)]
    auth_emulator: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the store connection is configured
    Check,
    /// Write the effective settings to the config file
    Init,
    /// Populate an empty project with demo data
    Seed {
        /// Also create the demo staff profiles
        #[arg(long)]
        with_users: bool,
    },
    /// Print every snapshot of a collection until Ctrl-C
    Watch {
        collection: String,
        /// Field to order by
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long)]
        desc: bool,
    },
    /// List and adjust stock
    Inventory {
        #[command(subcommand)]
        action: Option<InventoryAction>,
    },
    /// List and update daily tasks
    Tasks {
        #[command(subcommand)]
        action: Option<TaskAction>,
    },
    /// Sign in and show the resolved session
    Whoami,
    /// Ask the assistant a question
    Chat {
        message: String,
        /// JSON file holding earlier turns. Defaults to the base dir's chat history
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Draft an audit compliance report
    Audit {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level), &paths);

    let credentials = match (cli.email, cli.password) {
        (Some(email), Some(password)) => Some(Credentials { email, password }),
        _ => None,
    };
    let endpoints = Endpoints {
        store: cli.emulator,
        auth: cli.auth_emulator,
    };
    let connect = (&config, &endpoints, credentials);

    match cli.command {
        Commands::Check => commands::check(&config),
        Commands::Init => commands::init(&config, &paths)?,
        Commands::Seed { with_users } => commands::seed(connect, with_users).await?,
        Commands::Watch {
            collection,
            order_by,
            desc,
        } => commands::watch(connect, &collection, order_by, desc).await?,
        Commands::Inventory { action } => commands::inventory(connect, action).await?,
        Commands::Tasks { action } => commands::tasks(connect, action).await?,
        Commands::Whoami => commands::whoami(connect).await?,
        Commands::Chat { message, history } => {
            let history = history.unwrap_or_else(|| paths.chat_history_file());
            commands::chat(&config, &message, &history).await?
        }
        Commands::Audit { from, to } => commands::audit(&config, from, to).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn inventory_add_accepts_negative_numbers_for_validation() {
        let cli = Cli::try_parse_from([
            "highpoint", "inventory", "add", "Gloves", "PPE", "-3", "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Inventory {
                action: Some(InventoryAction::Add { quantity, .. }),
            } => assert_eq!(quantity, -3),
            _ => panic!("expected inventory add"),
        }
    }

    #[test]
    fn audit_dates_parse() {
        let cli = Cli::try_parse_from([
            "highpoint", "audit", "--from", "2024-05-01", "--to", "2024-05-31",
        ])
        .unwrap();
        match cli.command {
            Commands::Audit { from, to } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 5, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2024, 5, 31));
            }
            _ => panic!("expected audit"),
        }
    }

    #[test]
    fn task_status_accepts_display_spelling() {
        let cli = Cli::try_parse_from([
            "highpoint", "tasks", "status", "abc", "In Progress",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tasks {
                action: Some(TaskAction::Status { .. })
            }
        ));
    }
}
