//! Integration test harness for the Dabs site.
//!
//! Every test gets its own pair of servers on ephemeral ports:
//!
//! - [`Upstream`] stands in for both Google services the site talks to. It
//!   answers the Sheets `values.get` call from in-memory tabs and records
//!   every POST made to `/script/{kind}` (the Apps Script targets).
//! - [`TestSite`] serves the real site router against that upstream.
//!
//! ```rust,ignore
//! let upstream = Upstream::start().await;
//! upstream.set_tab("Stores", stores_tab()).await;
//! let site = TestSite::start(&upstream).await;
//! let resp = site.client().get(site.url("/api/stores")).send().await?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dabs_site::config::{SheetsConfig, SiteConfig};
use dabs_site::routes;
use dabs_site::services::SubmissionTarget;
use dabs_site::state::AppState;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use url::Url;

pub const SHEET_ID: &str = "test-sheet";
pub const API_KEY: &str = "AIzaTestKey7Qm2LkT7vPz4RwN8cYhJ5dF1";

/// A POST received by the fake Apps Script.
#[derive(Debug, Clone)]
pub struct Forwarded {
    /// `request`, `contact` or `signup`.
    pub kind: String,
    pub body: Value,
}

struct UpstreamData {
    tabs: HashMap<String, Vec<Vec<String>>>,
    sheets_status: StatusCode,
    script_status: StatusCode,
    forwarded: Vec<Forwarded>,
}

/// Fake Sheets API plus Apps Script endpoints.
#[derive(Clone)]
pub struct Upstream {
    pub base_url: String,
    data: Arc<Mutex<UpstreamData>>,
}

impl Upstream {
    /// Start the fake upstream with no tabs and 200 responses.
    pub async fn start() -> Self {
        let data = Arc::new(Mutex::new(UpstreamData {
            tabs: HashMap::new(),
            sheets_status: StatusCode::OK,
            script_status: StatusCode::OK,
            forwarded: Vec::new(),
        }));

        let app = Router::new()
            .route("/v4/spreadsheets/{sheet_id}/values/{tab}", get(values))
            .route("/script/{kind}", post(script))
            .with_state(Arc::clone(&data));

        let (listener, addr) = bind().await;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            data,
        }
    }

    /// Set a tab's contents; the first row is the header.
    pub async fn set_tab(&self, tab: &str, rows: &[&[&str]]) {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        self.data.lock().await.tabs.insert(tab.to_string(), rows);
    }

    /// Status the Sheets API answers with.
    pub async fn set_sheets_status(&self, status: StatusCode) {
        self.data.lock().await.sheets_status = status;
    }

    /// Status the Apps Script endpoints answer with.
    pub async fn set_script_status(&self, status: StatusCode) {
        self.data.lock().await.script_status = status;
    }

    /// Everything POSTed to the script endpoints so far.
    pub async fn forwarded(&self) -> Vec<Forwarded> {
        self.data.lock().await.forwarded.clone()
    }

    /// Target pointing at `/script/{kind}`.
    ///
    /// # Panics
    ///
    /// Panics if the upstream base URL is not a valid URL.
    #[must_use]
    pub fn target(&self, kind: &str) -> SubmissionTarget {
        SubmissionTarget::SheetProxy {
            endpoint: Url::parse(&format!("{}/script/{kind}", self.base_url))
                .expect("upstream URL parses"),
        }
    }

    /// Site configuration wired to this upstream.
    #[must_use]
    pub fn site_config(&self) -> SiteConfig {
        let mut config = SiteConfig::local();
        config.sheets = Some(SheetsConfig {
            sheet_id: SHEET_ID.to_string(),
            api_key: SecretString::from(API_KEY),
        });
        config.sheets_api_base = self.base_url.clone();
        config.cache_ttl = Duration::from_secs(60);
        config.request_target = Some(self.target("request"));
        config.contact_target = self.target("contact");
        config.signup_target = self.target("signup");
        config
    }
}

#[derive(Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

async fn values(
    State(data): State<Arc<Mutex<UpstreamData>>>,
    Path((sheet_id, tab)): Path<(String, String)>,
    Query(query): Query<KeyQuery>,
) -> Response {
    if sheet_id != SHEET_ID || query.key.as_deref() != Some(API_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"message": "The caller does not have permission"}})),
        )
            .into_response();
    }

    let data = data.lock().await;
    if !data.sheets_status.is_success() {
        return (data.sheets_status, "upstream unavailable").into_response();
    }

    // The real API omits `values` for an empty tab.
    match data.tabs.get(&tab) {
        Some(rows) => Json(json!({"range": format!("{tab}!A1:Z"), "values": rows})).into_response(),
        None => Json(json!({"range": format!("{tab}!A1:Z")})).into_response(),
    }
}

async fn script(
    State(data): State<Arc<Mutex<UpstreamData>>>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = data.lock().await;
    if !data.script_status.is_success() {
        return (data.script_status, "script error").into_response();
    }

    data.forwarded.push(Forwarded { kind, body });
    Json(json!({"result": "success"})).into_response()
}

/// The real site router, served on an ephemeral port.
pub struct TestSite {
    pub base_url: String,
    pub state: AppState,
}

impl TestSite {
    /// Serve the site against `upstream`.
    pub async fn start(upstream: &Upstream) -> Self {
        Self::start_with(upstream.site_config()).await
    }

    /// Serve the site with a hand-tuned configuration.
    pub async fn start_with(config: SiteConfig) -> Self {
        let state = AppState::new(config);
        let app = routes::router(state.clone());
        let (listener, addr) = bind().await;
        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client with a cookie store that does not follow redirects.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised.
    #[must_use]
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }
}

/// Bind an ephemeral port on localhost.
async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    (listener, addr)
}

/// Stores tab with the header row and two New Mexico stores.
pub const STORES_TAB: &[&[&str]] = &[
    &["State", "Name", "Address", "City", "Zip", "Phone", "Latitude", "Longitude"],
    &["NM", "High Desert Dispensary", "100 Central Ave", "Albuquerque", "87102", "505-555-0101", "35.0844", "-106.6504"],
    &["NM", "Taos Greens", "5 Plaza", "Taos", "87571", "575-555-0102", "36.4072", "-105.5731"],
];

/// ProductRequests header row.
pub const REQUESTS_HEADER: &[&str] = &[
    "Timestamp", "City", "Store", "Product", "Email", "Instagram", "Date", "Status",
];
