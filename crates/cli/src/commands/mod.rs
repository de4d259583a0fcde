//! CLI command implementations.
//!
//! Each command loads `SiteConfig` from the environment, talks to the same
//! Sheets tabs and submission targets as the site, and prints plain text
//! to stdout. Diagnostics go to stderr through `tracing`.

pub mod request;
pub mod requests;
pub mod stores;

use dabs_core::SubmissionError;
use dabs_site::config::{ConfigError, SiteConfig};
use dabs_site::services::ForwardError;
use dabs_site::sheets::{SheetsClient, SheetsError};
use thiserror::Error;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sheets error: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Invalid request: {0}")]
    Validation(#[from] SubmissionError),

    #[error("Forward failed: {0}")]
    Forward(#[from] ForwardError),

    #[error("No store data found")]
    NoStores,

    #[error("REQUEST_SCRIPT_URL is not set")]
    NoRequestTarget,
}

/// Config plus a Sheets client, as every read command needs.
fn sheets_from_env() -> Result<(SiteConfig, SheetsClient), CliError> {
    let config = SiteConfig::from_env()?;
    if config.sheets.is_none() {
        tracing::warn!("SHEET_ID or GOOGLE_SHEETS_API_KEY not set");
    }
    let sheets = SheetsClient::new(&config, reqwest::Client::new());
    Ok((config, sheets))
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
fn emit(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
