//! `dabs-cli stores` - list stores the way the locator page would.

use dabs_core::Coordinates;
use dabs_core::locator::{LocatorResult, StoreQuery, locate};
use dabs_site::sheets::Freshness;

use super::{CliError, emit, sheets_from_env};

/// Fetch the store list and print the locator result for the filters.
///
/// # Errors
///
/// Returns `CliError` if the sheet cannot be read or has no stores.
pub async fn list(
    state: Option<String>,
    zip: Option<String>,
    near: Option<Coordinates>,
) -> Result<(), CliError> {
    let (_, sheets) = sheets_from_env()?;
    let stores = sheets
        .stores(Freshness::Fresh)
        .await?
        .ok_or(CliError::NoStores)?;

    let query = StoreQuery {
        region: state,
        zip,
        origin: near,
    };
    let result = locate(&stores, &query);
    tracing::debug!(total = stores.len(), shown = result.hits.len(), "Located stores");

    emit(&render(&result));
    Ok(())
}

fn render(result: &LocatorResult<'_>) -> Vec<String> {
    let mut lines = Vec::with_capacity(result.hits.len() + 2);

    if let Some(notice) = result.notice {
        lines.push(notice.message().to_string());
    }
    lines.push(result.count_label());

    for hit in &result.hits {
        let store = hit.store;
        let mut line = format!(
            "{} | {}, {}, {} {} | {}",
            store.name, store.address, store.city, store.state, store.zip, store.phone
        );
        if let Some(distance) = hit.distance_label() {
            line.push_str(" | ");
            line.push_str(&distance);
        }
        lines.push(line);
    }

    lines
}
