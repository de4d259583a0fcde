//! Store locator filtering: region, ZIP search and distance ordering.

use std::collections::BTreeSet;

use crate::geo::Coordinates;
use crate::types::StoreRecord;

/// Map centre before any search (Albuquerque, NM).
pub const DEFAULT_CENTER: Coordinates = Coordinates::new(35.0844, -106.6504);
pub const DEFAULT_ZOOM: u8 = 7;
/// Zoom used when centring on a ZIP search hit.
pub const ZIP_ZOOM: u8 = 12;

/// What the visitor asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    /// Exact match on [`StoreRecord::state`]. Empty means all regions.
    pub region: Option<String>,
    /// Raw ZIP input; non-digits are ignored.
    pub zip: Option<String>,
    /// Visitor location, once known.
    pub origin: Option<Coordinates>,
}

/// A notice shown above the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorNotice {
    InvalidZip,
    NoStoresInZip,
}

impl LocatorNotice {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidZip => "Please enter a valid 5-digit ZIP code",
            Self::NoStoresInZip => "No stores found in that ZIP code. Showing all stores.",
        }
    }
}

/// A store in the result list, with its distance when an origin is known.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit<'a> {
    pub store: &'a StoreRecord,
    pub distance_miles: Option<f64>,
}

impl StoreHit<'_> {
    /// `"12.3 miles away"`.
    #[must_use]
    pub fn distance_label(&self) -> Option<String> {
        self.distance_miles.map(|d| format!("{d:.1} miles away"))
    }
}

/// Where the map should point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    /// Fit the map to all markers instead of using `center`/`zoom`.
    pub fit_markers: bool,
}

/// Outcome of a locator query.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorResult<'a> {
    pub hits: Vec<StoreHit<'a>>,
    pub notice: Option<LocatorNotice>,
    pub map: MapView,
}

impl LocatorResult<'_> {
    /// `"1 store"` / `"4 stores"`.
    #[must_use]
    pub fn count_label(&self) -> String {
        store_count_label(self.hits.len())
    }
}

#[must_use]
pub fn store_count_label(count: usize) -> String {
    if count == 1 {
        "1 store".to_string()
    } else {
        format!("{count} stores")
    }
}

/// Apply `query` to `stores`.
///
/// A valid 5-digit ZIP searches every store and replaces the region filter;
/// with no match the full list is shown with a notice. Without a ZIP, or
/// with an invalid one, the region filter applies. With an origin every hit
/// is annotated with its distance and the list is sorted nearest first.
#[must_use]
pub fn locate<'a>(stores: &'a [StoreRecord], query: &StoreQuery) -> LocatorResult<'a> {
    let region = query.region.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let in_region: Vec<&StoreRecord> = stores
        .iter()
        .filter(|s| region.is_none_or(|r| s.state == r))
        .collect();

    let mut notice = None;
    let mut map = MapView {
        center: DEFAULT_CENTER,
        zoom: DEFAULT_ZOOM,
        fit_markers: true,
    };

    let selected = match query.zip.as_deref().map(zip_digits) {
        None => in_region,
        Some(zip) if zip.is_empty() => in_region,
        Some(zip) if zip.len() != 5 => {
            notice = Some(LocatorNotice::InvalidZip);
            in_region
        }
        Some(zip) => {
            let matched: Vec<&StoreRecord> = stores.iter().filter(|s| s.zip == zip).collect();
            if let Some(first) = matched.first() {
                map = MapView {
                    center: first.coordinates(),
                    zoom: ZIP_ZOOM,
                    fit_markers: false,
                };
                matched
            } else {
                notice = Some(LocatorNotice::NoStoresInZip);
                stores.iter().collect()
            }
        }
    };

    let mut hits: Vec<StoreHit<'a>> = selected
        .into_iter()
        .map(|store| StoreHit {
            store,
            distance_miles: query.origin.map(|o| o.miles_to(&store.coordinates())),
        })
        .collect();

    if query.origin.is_some() {
        hits.sort_by(|a, b| {
            a.distance_miles
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.distance_miles.unwrap_or(f64::INFINITY))
        });
    }

    LocatorResult { hits, notice, map }
}

/// Distinct regions for the filter select, sorted.
#[must_use]
pub fn regions(stores: &[StoreRecord]) -> Vec<&str> {
    stores
        .iter()
        .map(|s| s.state.as_str())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn zip_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
