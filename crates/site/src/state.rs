//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::services::{Forwarder, StoreLocator};
use crate::sheets::SheetsClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    sheets: SheetsClient,
    forwarder: Forwarder,
    locator: Arc<StoreLocator>,
}

impl AppState {
    /// Build the state. One `reqwest::Client` is shared by the Sheets client
    /// and the forwarder.
    #[must_use]
    pub fn new(config: SiteConfig) -> Self {
        let http = reqwest::Client::new();
        let sheets = SheetsClient::new(&config, http.clone());
        let forwarder = Forwarder::new(http);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                sheets,
                forwarder,
                locator: Arc::new(StoreLocator::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn sheets(&self) -> &SheetsClient {
        &self.inner.sheets
    }

    #[must_use]
    pub fn forwarder(&self) -> &Forwarder {
        &self.inner.forwarder
    }

    #[must_use]
    pub fn locator(&self) -> &Arc<StoreLocator> {
        &self.inner.locator
    }

    /// Start the store locator's periodic refresh.
    pub fn start_store_refresh(&self) -> tokio::task::JoinHandle<()> {
        Arc::clone(&self.inner.locator)
            .spawn_refresh(self.inner.sheets.clone(), self.inner.config.store_refresh)
    }
}
