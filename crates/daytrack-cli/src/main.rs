mod config;
mod serve_cmd;
mod task_cmds;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};

use daytrack_core::{SystemClock, TaskService};
use daytrack_store::{DataDir, Section};

use config::{CliOverrides, DaytrackConfig};

#[derive(Parser)]
#[command(name = "daytrack", about = "Daily kanban board kept in plain Markdown files")]
struct Cli {
    /// Data directory (overrides DAYTRACK_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a daytrack config file and create the data directory
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Serve the JSON API and HTML overview
    Serve {
        /// Address to bind (overrides DAYTRACK_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides DAYTRACK_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show today's board
    List,
    /// Add a task to today's board
    Add {
        /// Task text
        text: String,
        /// Section: backlog, inProgress, done, sleep
        #[arg(long, default_value = "backlog")]
        section: Section,
    },
    /// Move a task to another section
    Move {
        task_id: String,
        /// Target section: backlog, inProgress, done, sleep
        section: Section,
        /// Position within the target section (appends when omitted)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Replace a task's text
    Edit { task_id: String, text: String },
    /// Mark a task as important
    Flag {
        task_id: String,
        /// Remove the flag instead
        #[arg(long)]
        clear: bool,
    },
    /// Check a task off without moving it
    Done {
        task_id: String,
        /// Uncheck instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Delete { task_id: String },
    /// This week's plan
    Weekly {
        #[command(subcommand)]
        command: WeeklyCommands,
    },
    /// List past days, or show one day's board
    History {
        /// Day to show (YYYY-MM-DD); omit to list all days
        date: Option<String>,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum WeeklyCommands {
    /// Show this week's plan
    List,
    /// Add an item to this week's plan
    Add { text: String },
    /// Toggle an item's checkbox
    Toggle { task_id: String },
    /// Remove an item
    Delete { task_id: String },
}

/// Execute the `daytrack init` command: write config file, create data dir.
fn cmd_init(data_dir: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let data_dir = data_dir.unwrap_or_else(daytrack_store::StoreConfig::default_data_dir);
    let cfg = config::ConfigFile {
        storage: config::StorageSection {
            data_dir: Some(data_dir.clone()),
        },
        server: config::ServerSection {
            bind: Some(config::DEFAULT_BIND.to_string()),
            port: Some(config::DEFAULT_PORT),
        },
    };

    config::save_config(&cfg)?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    println!("Config written to {}", path.display());
    println!("  storage.data_dir = {}", data_dir.display());
    println!(
        "  server = {}:{}",
        config::DEFAULT_BIND,
        config::DEFAULT_PORT
    );
    println!();
    println!("Next: run `daytrack add \"...\"` or `daytrack serve`.");

    Ok(())
}

fn build_service(resolved: &DaytrackConfig) -> Arc<TaskService> {
    Arc::new(TaskService::new(
        DataDir::from_config(&resolved.store),
        Arc::new(SystemClock),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(cli.data_dir, force)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "daytrack",
                &mut std::io::stdout(),
            );
        }
        Commands::Serve { bind, port } => {
            let resolved = DaytrackConfig::resolve(&CliOverrides {
                data_dir: cli.data_dir.as_deref(),
                bind: bind.as_deref(),
                port,
            })?;
            let service = build_service(&resolved);
            tracing::info!(data_dir = %resolved.store.data_dir.display(), "using data directory");
            serve_cmd::run_serve(service, &resolved.bind, resolved.port).await?;
        }
        command => {
            let resolved = DaytrackConfig::resolve(&CliOverrides {
                data_dir: cli.data_dir.as_deref(),
                ..CliOverrides::default()
            })?;
            let service = build_service(&resolved);
            task_cmds::run_task_command(command, &service).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialise tests that mutate process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }
}
