//! Unified error handling with Sentry integration.
//!
//! JSON endpoints return `Result<T, AppError>`; the error renders as
//! `{"error": "<one line>"}` with the matching status. Server-side errors
//! are captured to Sentry before responding, and their details never reach
//! the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dabs_core::{SchemaMismatch, SubmissionError};
use serde_json::json;
use thiserror::Error;

use crate::services::ForwardError;
use crate::sheets::SheetsError;

/// Which listing a fetch error belongs to, for the public message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Stores,
    Requests,
}

impl Listing {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::Stores => "Failed to fetch store data",
            Self::Requests => "Failed to fetch request data",
        }
    }
}

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Required configuration is missing.
    #[error("Server not configured: {0}")]
    Misconfigured(&'static str),

    /// Required input is missing or malformed.
    #[error(transparent)]
    Validation(#[from] SubmissionError),

    /// Body could not be decoded.
    #[error("Invalid request body")]
    InvalidBody,

    /// Reading a sheet failed.
    #[error("Fetch failed: {source}")]
    FetchFailed {
        listing: Listing,
        #[source]
        source: SheetsError,
    },

    /// The sheet's header row no longer matches the expected columns.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(SchemaMismatch),

    /// Forwarding a submission failed.
    #[error("Submission failed: {0}")]
    SubmissionFailed(#[from] ForwardError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
}

impl AppError {
    /// Classify a Sheets error for `listing`.
    #[must_use]
    pub fn from_sheets(listing: Listing, err: SheetsError) -> Self {
        match err {
            SheetsError::NotConfigured => Self::Misconfigured("Google Sheets credentials"),
            SheetsError::Schema(mismatch) => Self::SchemaMismatch(mismatch),
            source => Self::FetchFailed { listing, source },
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Validation(_) | Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Misconfigured(_)
            | Self::FetchFailed { .. }
            | Self::SchemaMismatch(_)
            | Self::SubmissionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The one-line message shown to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Misconfigured(_) => "Server not configured".to_string(),
            Self::FetchFailed { listing, .. } => listing.failure_message().to_string(),
            Self::SchemaMismatch(_) => "Sheet layout not recognized".to_string(),
            Self::SubmissionFailed(_) => "Failed to submit request".to_string(),
            Self::MethodNotAllowed | Self::Validation(_) | Self::InvalidBody | Self::NotFound(_) => {
                self.to_string()
            }
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    /// Log and, for server errors, report to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (
            self.status(),
            Json(json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(AppError::MethodNotAllowed), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            status_of(AppError::Validation(SubmissionError::MissingFields(vec!["city"]))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::NotFound("No store data found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Misconfigured("REQUEST_SCRIPT_URL")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_messages_hide_causes() {
        let err = AppError::from_sheets(
            Listing::Requests,
            SheetsError::Api {
                status: 403,
                message: "API key not valid".to_string(),
            },
        );
        assert_eq!(err.public_message(), "Failed to fetch request data");

        let err = AppError::from_sheets(Listing::Stores, SheetsError::NotConfigured);
        assert_eq!(err.public_message(), "Server not configured");

        let err = AppError::from_sheets(
            Listing::Stores,
            SheetsError::Schema(SchemaMismatch {
                missing: vec!["latitude"],
            }),
        );
        assert!(matches!(err, AppError::SchemaMismatch(_)));
        assert!(!err.public_message().contains("latitude"));
    }

    #[tokio::test]
    async fn test_body_is_json_error() {
        let response = AppError::MethodNotAllowed.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"error": "Method not allowed"}));
    }
}
