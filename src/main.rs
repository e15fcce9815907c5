//! lanyard-cli - Discord presence in the terminal
//!
//! Polls the public Lanyard API for a user's Discord presence and shows
//! online status, activities and Spotify listening data.

mod api;
mod models;
mod poller;
mod tui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Discord user the tool tracks by default; override with --user.
const DEFAULT_USER_ID: &str = "728076716219695148";

#[derive(Parser)]
#[command(name = "lanyard-cli")]
#[command(about = "Lightweight CLI viewer for Discord presence via the Lanyard API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the presence document once and print it
    Status {
        /// Discord user ID to look up
        #[arg(short, long, default_value = DEFAULT_USER_ID)]
        user: String,

        /// Print the raw presence document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch presence live in a TUI, refreshed every 60s
    Watch {
        /// Discord user ID to look up
        #[arg(short, long, default_value = DEFAULT_USER_ID)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Status { user, json } => {
            api::show_status(&user, json).await?;
        }
        Commands::Watch { user } => {
            tui::run(user).await?;
        }
    }

    Ok(())
}
