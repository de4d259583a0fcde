//! Store locator controller.
//!
//! Owns the most recent store list. A background task re-fetches the whole
//! list on a fixed interval for the life of the process; page views only
//! read the snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dabs_core::StoreRecord;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::sheets::{Freshness, SheetsClient, SheetsError};

/// Stores as of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub stores: Vec<StoreRecord>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct StoreLocator {
    snapshot: RwLock<Option<Arc<StoreSnapshot>>>,
}

impl StoreLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, or `None` before the first successful refresh.
    pub async fn snapshot(&self) -> Option<Arc<StoreSnapshot>> {
        self.snapshot.read().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// Replace the snapshot. The last refresh to complete wins.
    pub async fn replace(&self, stores: Vec<StoreRecord>) {
        let snapshot = Arc::new(StoreSnapshot {
            stores,
            refreshed_at: Utc::now(),
        });
        *self.snapshot.write().await = Some(snapshot);
    }

    /// Fetch the store list and swap it in. On failure the previous snapshot
    /// stays in place.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError` if the sheet could not be read.
    #[instrument(skip_all)]
    pub async fn refresh(&self, sheets: &SheetsClient) -> Result<usize, SheetsError> {
        let stores = sheets.stores(Freshness::Fresh).await?.unwrap_or_default();
        let count = stores.len();
        self.replace(stores).await;
        tracing::info!(count, "Store list refreshed");
        Ok(count)
    }

    /// Refresh now and then every `every` (at least one second), until the
    /// runtime shuts down.
    pub fn spawn_refresh(
        self: Arc<Self>,
        sheets: SheetsClient,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh(&sheets).await {
                    tracing::warn!(error = %e, "Store refresh failed");
                }
            }
        })
    }
}
