//! Google Sheets values API client.
//!
//! Reads whole tabs with the public API key and projects them into records
//! with `dabs_core::sheet`. Listings are cached in-memory via `moka`; the
//! TTL comes from `SHEETS_CACHE_TTL_SECS`.

use std::sync::Arc;
use std::time::Duration;

use dabs_core::sheet::{FromSheetRow, SchemaMismatch, SheetTable};
use dabs_core::{RequestRecord, StoreRecord};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{SheetsConfig, SiteConfig};

/// Errors that can occur when reading a sheet.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Sheet id or API key missing.
    #[error("Google Sheets is not configured")]
    NotConfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Request URL could not be built.
    #[error("Invalid sheet URL: {0}")]
    Url(#[from] url::ParseError),

    /// Header row lacks a required column.
    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
}

/// Whether a read may be served from the listing cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Cached,
    Fresh,
}

/// The `values.get` response. `values` is absent for an empty tab.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Client for the Sheets values API.
#[derive(Clone)]
pub struct SheetsClient {
    inner: Arc<SheetsClientInner>,
}

struct SheetsClientInner {
    client: reqwest::Client,
    api_base: String,
    sheets: Option<SheetsConfig>,
    stores_tab: String,
    requests_tab: String,
    cache: Cache<String, Arc<SheetTable>>,
}

impl SheetsClient {
    #[must_use]
    pub fn new(config: &SiteConfig, client: reqwest::Client) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.cache_ttl.max(Duration::from_secs(1)))
            .build();

        Self {
            inner: Arc::new(SheetsClientInner {
                client,
                api_base: config.sheets_api_base.clone(),
                sheets: config.sheets.clone(),
                stores_tab: config.stores_sheet.clone(),
                requests_tab: config.requests_sheet.clone(),
                cache,
            }),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.sheets.is_some()
    }

    /// Stores in sheet order. `None` when the tab has no data rows.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError` on configuration, transport or schema problems.
    pub async fn stores(
        &self,
        freshness: Freshness,
    ) -> Result<Option<Vec<StoreRecord>>, SheetsError> {
        self.load(&self.inner.stores_tab, freshness).await
    }

    /// Product requests in sheet order; empty when the tab has no data rows.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError` on configuration, transport or schema problems.
    pub async fn requests(&self, freshness: Freshness) -> Result<Vec<RequestRecord>, SheetsError> {
        Ok(self
            .load(&self.inner.requests_tab, freshness)
            .await?
            .unwrap_or_default())
    }

    async fn load<T: FromSheetRow>(
        &self,
        tab: &str,
        freshness: Freshness,
    ) -> Result<Option<Vec<T>>, SheetsError> {
        let table = self.table(tab, freshness).await?;
        if !table.has_data() {
            return Ok(None);
        }

        let projection = table.project::<T>()?;
        for rejected in &projection.rejected {
            tracing::warn!(tab, row = rejected.row, error = %rejected.error, "Skipping sheet row");
        }

        Ok(Some(projection.records))
    }

    /// Raw tab contents, from the cache when allowed.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError` if the tab cannot be fetched.
    pub async fn table(
        &self,
        tab: &str,
        freshness: Freshness,
    ) -> Result<Arc<SheetTable>, SheetsError> {
        if freshness == Freshness::Cached
            && let Some(table) = self.inner.cache.get(tab).await
        {
            debug!(tab, "Cache hit for sheet");
            return Ok(table);
        }

        let table = Arc::new(self.fetch(tab).await?);
        self.inner
            .cache
            .insert(tab.to_string(), Arc::clone(&table))
            .await;
        Ok(table)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, tab: &str) -> Result<SheetTable, SheetsError> {
        let sheets = self.inner.sheets.as_ref().ok_or(SheetsError::NotConfigured)?;

        let mut url = Url::parse(&format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.inner.api_base,
            urlencoding::encode(&sheets.sheet_id),
            urlencoding::encode(tab),
        ))?;
        url.query_pairs_mut()
            .append_pair("key", sheets.api_key.expose_secret());

        // reqwest errors carry the URL, which carries the key.
        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let range: ValueRange = response.json().await.map_err(reqwest::Error::without_url)?;
        debug!(rows = range.values.len(), "Fetched sheet values");

        Ok(SheetTable::from_values(
            range
                .values
                .into_iter()
                .map(|row| row.into_iter().map(cell_text).collect())
                .collect(),
        ))
    }
}

/// Cells come back as strings by default; numbers and booleans appear with
/// other render options.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(Value::String("Bend".to_string())), "Bend");
        assert_eq!(cell_text(serde_json::json!(35.08)), "35.08");
        assert_eq!(cell_text(Value::Null), "");
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_not_configured() {
        let client = SheetsClient::new(&SiteConfig::local(), reqwest::Client::new());
        assert!(!client.is_configured());
        let err = client.requests(Freshness::Fresh).await.unwrap_err();
        assert!(matches!(err, SheetsError::NotConfigured));
    }
}
