//! Dabs CLI - operator tools against the site's Google Sheets.
//!
//! # Usage
//!
//! ```bash
//! # List stores, optionally filtered and sorted by distance
//! dabs-cli stores --state NM --near 35.08,-106.65
//!
//! # Headline numbers and rankings for product requests
//! dabs-cli requests summary
//!
//! # Product requests, newest first
//! dabs-cli requests list --search rosin
//!
//! # Forward a test product request through the configured target
//! dabs-cli request send --city Bend --store "Mountain High" --product Badder
//! ```
//!
//! Configuration is read from the same environment as the site
//! (`SHEET_ID`, `GOOGLE_SHEETS_API_KEY`, `REQUEST_SCRIPT_URL`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use dabs_core::Coordinates;

mod commands;

#[derive(Parser)]
#[command(name = "dabs-cli")]
#[command(author, version, about = "Dabs site CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stores from the Stores sheet
    Stores {
        /// Only stores in this state
        #[arg(long)]
        state: Option<String>,

        /// Only stores in this 5-digit ZIP code
        #[arg(long)]
        zip: Option<String>,

        /// Sort by distance from LAT,LNG
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        near: Option<Coordinates>,
    },
    /// Report on product requests
    Requests {
        #[command(subcommand)]
        action: RequestsAction,
    },
    /// Submit a product request
    Request {
        #[command(subcommand)]
        action: RequestAction,
    },
}

#[derive(Subcommand)]
enum RequestsAction {
    /// Totals and the most requested stores, cities and products
    Summary,
    /// Requests, newest first
    List {
        /// Case-insensitive text to match
        #[arg(short, long, default_value = "")]
        search: String,
    },
}

#[derive(Subcommand)]
enum RequestAction {
    /// Validate and forward a request to the configured target
    Send {
        #[arg(long)]
        city: String,

        #[arg(long)]
        store: String,

        #[arg(long)]
        product: String,

        #[arg(long)]
        email: Option<String>,

        /// Instagram handle
        #[arg(long)]
        instagram: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dabs_cli=info,dabs_site=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Stores { state, zip, near } => commands::stores::list(state, zip, near).await,
        Commands::Requests { action } => match action {
            RequestsAction::Summary => commands::requests::summary().await,
            RequestsAction::List { search } => commands::requests::list(search).await,
        },
        Commands::Request { action } => match action {
            RequestAction::Send {
                city,
                store,
                product,
                email,
                instagram,
            } => {
                commands::request::send(commands::request::NewRequest {
                    city,
                    store,
                    product,
                    email,
                    instagram,
                })
                .await
            }
        },
    }
}
