//! `dabs-cli request send` - submit a product request from the terminal.

use chrono::Local;
use dabs_core::RequestRecord;
use dabs_core::submission::RequestSubmission;
use dabs_site::config::SiteConfig;
use dabs_site::services::Forwarder;

use super::{CliError, emit};

/// Command-line fields of a product request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub city: String,
    pub store: String,
    pub product: String,
    pub email: Option<String>,
    pub instagram: Option<String>,
}

impl NewRequest {
    /// Validate and stamp the request as the site's JSON endpoint would.
    fn into_record(self) -> Result<RequestRecord, CliError> {
        let submission = RequestSubmission {
            city: Some(self.city),
            store: Some(self.store),
            product: Some(self.product),
            email: self.email,
            instagram: self.instagram,
            ..RequestSubmission::default()
        };
        Ok(submission.into_record(Local::now())?)
    }
}

/// Forward a product request to `REQUEST_SCRIPT_URL`.
///
/// # Errors
///
/// Returns `CliError` if no target is configured, the fields are invalid,
/// or the target rejects the request.
pub async fn send(request: NewRequest) -> Result<(), CliError> {
    let config = SiteConfig::from_env()?;
    let target = config.request_target.ok_or(CliError::NoRequestTarget)?;
    let record = request.into_record()?;

    tracing::info!(destination = %target, city = %record.city, "Sending product request");
    Forwarder::new(reqwest::Client::new())
        .forward(&target, "product_request", &record)
        .await?;

    emit(&[format!(
        "Request recorded: {} at {} ({})",
        record.product, record.store, record.city
    )]);
    Ok(())
}
