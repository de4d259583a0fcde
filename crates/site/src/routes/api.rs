//! JSON endpoints backed by the spreadsheet.
//!
//! ```text
//! GET  /api/stores    - StoreRecord[] (404 when the tab has no rows)
//! GET  /api/requests  - RequestRecord[] ([] when the tab has no rows)
//! POST /api/request   - validate, stamp defaults and forward a request
//! ```
//!
//! Any other method on these paths answers 405 without reading the body.

use axum::{Json, body::Bytes, extract::State};
use chrono::Local;
use dabs_core::{RequestRecord, StoreRecord, submission::RequestSubmission};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Listing, Result, add_breadcrumb};
use crate::sheets::Freshness;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
}

/// Method fallback for the API routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[instrument(skip(state))]
pub async fn stores(State(state): State<AppState>) -> Result<Json<Vec<StoreRecord>>> {
    let stores = state
        .sheets()
        .stores(Freshness::Cached)
        .await
        .map_err(|e| AppError::from_sheets(Listing::Stores, e))?;

    stores
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No store data found".to_string()))
}

#[instrument(skip(state))]
pub async fn requests(State(state): State<AppState>) -> Result<Json<Vec<RequestRecord>>> {
    let requests = state
        .sheets()
        .requests(Freshness::Cached)
        .await
        .map_err(|e| AppError::from_sheets(Listing::Requests, e))?;

    Ok(Json(requests))
}

/// Submit a product request.
///
/// The body is decoded by hand so malformed JSON answers with the same
/// `{"error"}` shape as every other failure.
#[instrument(skip(state, body))]
pub async fn submit_request(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitResponse>> {
    let target = state
        .config()
        .request_target
        .as_ref()
        .ok_or(AppError::Misconfigured("REQUEST_SCRIPT_URL"))?;

    let submission: RequestSubmission = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Undecodable request body");
        AppError::InvalidBody
    })?;
    let record = submission.into_record(Local::now())?;

    state
        .forwarder()
        .forward(target, "product_request", &record)
        .await?;
    add_breadcrumb("request", &format!("{} at {}", record.product, record.store));

    Ok(Json(SubmitResponse { success: true }))
}
