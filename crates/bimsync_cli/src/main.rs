//! bimsync CLI
//!
//! Command-line driver for importing door records into a document snapshot.
//!
//! # Commands
//!
//! - `import` - Apply records modified since a timestamp, once
//! - `subscribe` - Poll the record feed for a fixed number of cycles
//! - `version` - Show version information

mod commands;

use bimsync_engine::SyncConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Synchronizes document entities with an external record database.
#[derive(Parser)]
#[command(name = "bimsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by the sync commands.
#[derive(Args)]
struct SyncArgs {
    /// Path to the document snapshot (JSON)
    #[arg(short, long)]
    document: PathBuf,

    /// Path to the record feed (JSON array of door records)
    #[arg(short, long)]
    records: PathBuf,

    /// Name of the shared rating field
    #[arg(long, default_value = "FireRating")]
    rating_field: String,

    /// Name of the built-in label field
    #[arg(long, default_value = "Mark")]
    label_field: String,
}

impl SyncArgs {
    fn config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_rating_field_name(self.rating_field.as_str())
            .with_label_field_name(self.label_field.as_str())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every record modified at or after a timestamp
    Import {
        #[command(flatten)]
        sync: SyncArgs,

        /// Lower bound on `modified`; 0 imports the full history
        #[arg(short, long, default_value = "0")]
        since: u64,
    },

    /// Run the periodic subscription for a number of cycles
    Subscribe {
        #[command(flatten)]
        sync: SyncArgs,

        /// Timer interval in milliseconds
        #[arg(short, long, default_value = "10000")]
        interval_ms: u64,

        /// Number of cycles to run before unsubscribing
        #[arg(short, long, default_value = "1")]
        cycles: u64,

        /// Starting timestamp; unset or 0 starts from the current time
        #[arg(short, long)]
        since: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import { sync, since } => {
            commands::import::run(&sync.document, &sync.records, sync.config(), since)?;
        }
        Commands::Subscribe {
            sync,
            interval_ms,
            cycles,
            since,
        } => {
            let config = sync
                .config()
                .with_sync_interval(Duration::from_millis(interval_ms));
            commands::subscribe::run(&sync.document, &sync.records, config, cycles, since)?;
        }
        Commands::Version => {
            println!("bimsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
