//! Owner dashboard over submitted product requests.
//!
//! Requests on a local host get fixed demo records instead of the sheet.
//! Filters are applied to the loaded listing; `?refresh` bypasses the
//! listing cache.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use chrono::Local;
use dabs_core::RequestRecord;
use dabs_core::dashboard::{
    self, Bar, FilterOptions, RequestField, RequestFilter, RequestStats,
};
use serde::Deserialize;
use tracing::instrument;

use super::Banner;
use crate::cookies::VisitorCookies;
use crate::filters;
use crate::sheets::Freshness;
use crate::state::AppState;

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", ""];

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data. Try refreshing.";

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub search: String,
    pub city: Option<String>,
    pub product: Option<String>,
    pub refresh: Option<String>,
}

/// Host without port; missing or unreadable counts as empty.
fn request_host(headers: &HeaderMap) -> &str {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    // Bracketed IPv6 literals keep their colons
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default();
    }
    host.split(':').next().unwrap_or_default()
}

#[must_use]
pub fn is_local_host(headers: &HeaderMap) -> bool {
    LOCAL_HOSTS.contains(&request_host(headers))
}

/// One row of the requests table.
#[derive(Debug, Clone)]
pub struct RequestRow {
    pub date: String,
    pub city: String,
    pub store: String,
    pub product: String,
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub status: String,
    pub status_class: &'static str,
}

impl From<&RequestRecord> for RequestRow {
    fn from(record: &RequestRecord) -> Self {
        Self {
            date: record.date.clone(),
            city: record.city.clone(),
            store: record.store.clone(),
            product: record.product.clone(),
            email: record.provided_email().map(str::to_string),
            instagram: record.instagram_handle().map(str::to_string),
            status: record.status.clone(),
            status_class: dashboard::status_class(&record.status),
        }
    }
}

/// Everything computed from a loaded listing.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub stats: RequestStats,
    pub store_bars: Vec<Bar>,
    pub city_bars: Vec<Bar>,
    pub product_bars: Vec<Bar>,
    pub email_lines: Vec<String>,
    pub options: FilterOptions,
    pub rows: Vec<RequestRow>,
}

impl DashboardData {
    #[must_use]
    pub fn build(records: &[RequestRecord], filter: &RequestFilter) -> Self {
        let products = dashboard::rank_by(records, RequestField::Product);

        Self {
            stats: RequestStats::compute(records, dashboard::local_month_start()),
            store_bars: dashboard::bar_chart(&dashboard::rank_by(records, RequestField::Store)),
            city_bars: dashboard::bar_chart(&dashboard::rank_by(records, RequestField::City)),
            email_lines: dashboard::email_preview_lines(&products),
            product_bars: dashboard::bar_chart(&products),
            options: FilterOptions::from_records(records),
            rows: filter.apply(records).into_iter().map(RequestRow::from).collect(),
        }
    }

    /// The three ranked charts with their headings.
    #[must_use]
    pub fn charts(&self) -> [(&'static str, &[Bar]); 3] {
        [
            ("By store", self.store_bars.as_slice()),
            ("By city", self.city_bars.as_slice()),
            ("By product", self.product_bars.as_slice()),
        ]
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub banner: Banner,
    pub demo: bool,
    pub search: String,
    pub city: String,
    pub product: String,
    pub data: Option<DashboardData>,
    pub error: Option<&'static str>,
}

async fn load(state: &AppState, demo: bool, freshness: Freshness) -> Option<Vec<RequestRecord>> {
    if demo {
        return Some(dashboard::demo_requests(Local::now()));
    }

    match state.sheets().requests(freshness).await {
        Ok(records) => Some(records),
        Err(e) => {
            tracing::error!(error = %e, "Dashboard failed to load requests");
            None
        }
    }
}

#[instrument(skip(state, headers))]
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let cookies = VisitorCookies::from_headers(&headers);
    let demo = is_local_host(&headers);
    let freshness = if query.refresh.is_some() {
        Freshness::Fresh
    } else {
        Freshness::Cached
    };

    let filter = RequestFilter {
        search: query.search.clone(),
        city: query.city.clone(),
        product: query.product.clone(),
    };

    let records = load(&state, demo, freshness).await;
    let error = records.is_none().then_some(LOAD_FAILED_MESSAGE);
    let data = records.map(|records| DashboardData::build(&records, &filter));

    DashboardTemplate {
        banner: Banner::new(&cookies, "/dashboard"),
        demo,
        search: query.search,
        city: query.city.unwrap_or_default(),
        product: query.product.unwrap_or_default(),
        data,
        error,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};

    use super::*;
    use crate::routes::test_support::*;

    fn host(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_local_hosts() {
        assert!(is_local_host(&host("localhost:3000")));
        assert!(is_local_host(&host("127.0.0.1")));
        assert!(is_local_host(&HeaderMap::new()));
        assert!(!is_local_host(&host("dabs.example.com")));
        assert!(!is_local_host(&host("[::1]:3000")));
    }

    #[test]
    fn test_demo_data_ranking() {
        let records = dashboard::demo_requests(Local::now());
        let data = DashboardData::build(&records, &RequestFilter::default());

        assert_eq!(data.stats.total, 5);
        assert_eq!(data.stats.this_month, 5);
        assert_eq!(data.stats.unique_cities, 3);
        assert_eq!(data.product_bars[0].label, "Live Rosin");
        assert_eq!(data.product_bars[0].count, 3);
        assert_eq!(data.email_lines[0], "Live Rosin - 3 requests");
        assert_eq!(data.rows.len(), 5);
    }

    #[test]
    fn test_filter_limits_rows_not_charts() {
        let records = dashboard::demo_requests(Local::now());
        let filter = RequestFilter {
            city: Some("Bend".to_string()),
            ..RequestFilter::default()
        };
        let data = DashboardData::build(&records, &filter);

        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].instagram.as_deref(), Some("dabfan"));
        assert_eq!(data.rows[0].status_class, "status-contacted");
        assert_eq!(data.stats.total, 5);
    }

    #[tokio::test]
    async fn test_local_host_renders_demo() {
        let response = send(app(), get("/dashboard", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("Demo data"));
        assert!(body.contains("Green Leaf Dispensary"));
    }

    #[tokio::test]
    async fn test_remote_host_without_sheets_shows_failure() {
        let request = Request::builder()
            .uri("/dashboard")
            .header(header::HOST, "dabs.example.com")
            .body(Body::empty())
            .unwrap();
        let response = send(app(), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(LOAD_FAILED_MESSAGE));
    }
}
