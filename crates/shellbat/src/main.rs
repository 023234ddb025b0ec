mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shellbat_core::ConfigPaths;

#[derive(Parser)]
#[command(name = "shellbat")]
#[command(about = "Inspect and edit ShellBat navigation history and settings")]
#[command(version)]
pub struct Cli {
    /// Configuration directory (defaults to the user config dir)
    #[arg(long, global = true, env = "SHELLBAT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List history entries, most recent first
    History,
    /// Record a visit to a location
    Visit {
        path: PathBuf,
        /// Display name (defaults to the last path component)
        #[arg(long)]
        name: Option<String>,
    },
    /// Move to an older entry
    Back {
        #[arg(long, default_value_t = 1)]
        step: usize,
    },
    /// Move to a newer entry
    Forward {
        #[arg(long, default_value_t = 1)]
        step: usize,
    },
    /// Remove a location and everything below it from the history
    Forget { root: String },
    /// Drop history entries and favorites that no longer exist
    Prune,
    /// Empty the history
    Clear,
    /// List favorites
    Favorites,
    /// Add or remove a favorite
    Favorite { path: PathBuf },
    /// Show or change global settings
    Settings {
        /// Use the settings of a named instance instead of the global ones
        #[arg(long)]
        instance: Option<String>,
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Back up settings and history now
    Backup,
    /// Print settings changes made by other instances until Ctrl-C
    Watch,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// List all properties
    List,
    /// Print one property
    Get { name: String },
    /// Change one property
    Set { name: String, value: String },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shellbat=info".parse()?)
                .add_directive("shellbat_core=warn".parse()?)
                .add_directive("notify=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let paths = match cli.config_dir {
        Some(dir) => ConfigPaths::in_dir(dir),
        None => ConfigPaths::new(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(commands::run(paths, cli.command))
}
