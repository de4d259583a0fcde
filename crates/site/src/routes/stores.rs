//! Store locator page.
//!
//! Reads the locator's current snapshot; a page view never triggers a
//! refresh. Filtering happens server-side from the query string, and the map
//! markers are handed to `static/js/store-map.js` as embedded JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use dabs_core::locator::{self, LocatorResult, StoreQuery};
use dabs_core::{Coordinates, StoreRecord};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::Banner;
use crate::cookies::VisitorCookies;
use crate::filters;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StoresQuery {
    pub state: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl StoresQuery {
    fn origin(&self) -> Option<Coordinates> {
        let lat = self.lat.as_deref()?.trim().parse().ok()?;
        let lng = self.lng.as_deref()?.trim().parse().ok()?;
        Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid)
    }

    fn to_store_query(&self) -> StoreQuery {
        StoreQuery {
            region: self.state.clone(),
            zip: self.zip.clone(),
            origin: self.origin(),
        }
    }

    /// Query string to carry the visitor's filters across links.
    fn return_to(&self) -> String {
        let pairs = [
            ("state", &self.state),
            ("zip", &self.zip),
            ("lat", &self.lat),
            ("lng", &self.lng),
        ];
        let query: Vec<String> = pairs
            .iter()
            .filter_map(|(key, value)| {
                let value = value.as_deref()?.trim();
                (!value.is_empty()).then(|| format!("{key}={}", urlencoding::encode(value)))
            })
            .collect();

        if query.is_empty() {
            "/stores".to_string()
        } else {
            format!("/stores?{}", query.join("&"))
        }
    }
}

/// A store in the list.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub name: String,
    pub address: String,
    pub locality: String,
    pub phone: String,
    pub phone_digits: String,
    pub directions_url: String,
    pub distance: Option<String>,
}

impl StoreCard {
    fn new(store: &StoreRecord, distance: Option<String>) -> Self {
        Self {
            name: store.name.clone(),
            address: store.address.clone(),
            locality: store.locality(),
            phone: store.phone.clone(),
            phone_digits: store.phone_digits(),
            directions_url: store.directions_url(),
            distance,
        }
    }
}

#[derive(Debug, Serialize)]
struct MapMarker<'a> {
    name: &'a str,
    address: &'a str,
    locality: String,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Serialize)]
struct MapData<'a> {
    center: Coordinates,
    zoom: u8,
    fit: bool,
    origin: Option<Coordinates>,
    markers: Vec<MapMarker<'a>>,
}

/// Marker data for the map script. `<` is escaped so the JSON cannot close
/// the surrounding `<script>` element.
fn map_json(result: &LocatorResult<'_>, origin: Option<Coordinates>) -> String {
    let data = MapData {
        center: result.map.center,
        zoom: result.map.zoom,
        fit: result.map.fit_markers,
        origin,
        markers: result
            .hits
            .iter()
            .map(|hit| MapMarker {
                name: &hit.store.name,
                address: &hit.store.address,
                locality: hit.store.locality(),
                lat: hit.store.latitude,
                lng: hit.store.longitude,
            })
            .collect(),
    };

    serde_json::to_string(&data)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

/// The search form and results, present once stores have loaded.
#[derive(Debug, Clone)]
pub struct LocatorView {
    pub regions: Vec<String>,
    pub notice: Option<&'static str>,
    pub count_label: String,
    pub cards: Vec<StoreCard>,
    pub map_json: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub banner: Banner,
    pub selected_region: String,
    pub zip: String,
    pub located: bool,
    pub view: Option<LocatorView>,
}

#[instrument(skip(state, headers))]
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StoresQuery>,
) -> impl IntoResponse {
    let cookies = VisitorCookies::from_headers(&headers);
    let store_query = query.to_store_query();

    let view = state.locator().snapshot().await.map(|snapshot| {
        let result = locator::locate(&snapshot.stores, &store_query);
        LocatorView {
            regions: locator::regions(&snapshot.stores)
                .into_iter()
                .map(str::to_string)
                .collect(),
            notice: result.notice.map(|n| n.message()),
            count_label: result.count_label(),
            cards: result
                .hits
                .iter()
                .map(|hit| StoreCard::new(hit.store, hit.distance_label()))
                .collect(),
            map_json: map_json(&result, store_query.origin),
        }
    });

    if view.is_none() {
        tracing::debug!("Store list not loaded yet");
    }

    StoresTemplate {
        banner: Banner::new(&cookies, query.return_to()),
        selected_region: query.state.clone().unwrap_or_default(),
        zip: query.zip.clone().unwrap_or_default(),
        located: store_query.origin.is_some(),
        view,
    }
}
