//! Forwarding of visitor submissions to their downstream target.
//!
//! Every submission kind (product request, contact message, email signup)
//! has one target, chosen once at startup from configuration. A forward is a
//! single JSON POST: no retry, and anything but a 2xx is a failure.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Where a submission goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionTarget {
    /// A generic webhook (Zapier, Make, n8n).
    Webhook { url: Url },
    /// A Google Apps Script web app that appends the row to the sheet.
    SheetProxy { endpoint: Url },
    /// Log the payload and report success. Local development only.
    DevLog,
}

impl SubmissionTarget {
    fn url(&self) -> Option<&Url> {
        match self {
            Self::Webhook { url } => Some(url),
            Self::SheetProxy { endpoint } => Some(endpoint),
            Self::DevLog => None,
        }
    }
}

impl fmt::Display for SubmissionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the host: script URLs embed deployment ids.
        let host = |url: &Url| url.host_str().unwrap_or_default().to_string();
        match self {
            Self::Webhook { url } => write!(f, "webhook({})", host(url)),
            Self::SheetProxy { endpoint } => write!(f, "sheet-proxy({})", host(endpoint)),
            Self::DevLog => f.write_str("dev-log"),
        }
    }
}

/// Errors that can occur when forwarding a submission.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Downstream answered with a non-success status.
    #[error("downstream returned {status}")]
    Status { status: u16 },

    /// Payload could not be encoded.
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Posts submissions downstream.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Send `payload` to `target`.
    ///
    /// # Errors
    ///
    /// Returns `ForwardError` on network failure or a non-2xx response.
    #[instrument(skip(self, payload), fields(target = %target))]
    pub async fn forward<T: Serialize + Sync>(
        &self,
        target: &SubmissionTarget,
        kind: &'static str,
        payload: &T,
    ) -> Result<(), ForwardError> {
        let Some(url) = target.url() else {
            let body = serde_json::to_string(payload)?;
            tracing::info!(kind, payload = %body, "Submission logged (dev mode)");
            return Ok(());
        };

        let response = self.client.post(url.clone()).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(kind, status = status.as_u16(), body = %body, "Downstream rejected submission");
            return Err(ForwardError::Status {
                status: status.as_u16(),
            });
        }

        tracing::info!(kind, "Submission forwarded");
        Ok(())
    }
}
