//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (first store refresh done)
//!
//! # Pages (age gated)
//! GET  /                       - Home: products, strain carousel, forms
//! GET  /products/{slug}        - Product detail
//! GET  /stores                 - Store locator
//!
//! # Owner
//! GET  /dashboard              - Product request dashboard
//!
//! # Forms (rate limited)
//! POST /contact                - Contact form
//! POST /request                - Product request form
//! POST /age-gate/email         - Newsletter signup from the age gate
//!
//! # Age gate and consent
//! GET  /age-gate               - Gate page
//! POST /age-gate/confirm       - Visitor is 21+
//! POST /age-gate/deny          - Visitor is under 21
//! POST /age-gate/skip          - Skip the email step
//! POST /cookies/consent        - Record a cookie consent choice
//!
//! # JSON API
//! GET  /api/stores             - Store listing
//! GET  /api/requests           - Request listing
//! POST /api/request            - Submit a product request (rate limited)
//! ```

pub mod age_gate;
pub mod api;
pub mod consent;
pub mod dashboard;
pub mod forms;
pub mod health;
pub mod home;
pub mod products;
pub mod stores;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::{Request, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::cookies::VisitorCookies;
use crate::filters;
use crate::middleware::{
    age_gate_middleware, request_id_middleware, security_headers_middleware,
    submission_rate_limiter,
};
use crate::state::AppState;

/// Static assets shipped with the crate.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Consent banner state, rendered by the base layout on every page.
#[derive(Debug, Clone)]
pub struct Banner {
    pub show: bool,
    /// Where the consent form sends the visitor back to.
    pub return_to: String,
}

impl Banner {
    #[must_use]
    pub fn new(cookies: &VisitorCookies, return_to: impl Into<String>) -> Self {
        Self {
            show: cookies.needs_consent(),
            return_to: return_to.into(),
        }
    }
}

/// Page shown for unknown paths and products.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub banner: Banner,
}

pub fn not_found(cookies: &VisitorCookies) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            banner: Banner::new(cookies, "/"),
        },
    )
        .into_response()
}

async fn fallback(headers: axum::http::HeaderMap) -> Response {
    not_found(&VisitorCookies::from_headers(&headers))
}

/// Pages that require the age cookie.
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products/{slug}", get(products::show))
        .route("/stores", get(stores::index))
        .route_layer(from_fn(age_gate_middleware))
}

/// Visitor submissions, limited per client IP.
fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(forms::contact))
        .route("/request", post(forms::request))
        .route("/age-gate/email", post(age_gate::email))
        .route(
            "/api/request",
            post(api::submit_request).fallback(api::method_not_allowed),
        )
        .route_layer(submission_rate_limiter())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/stores",
            get(api::stores).fallback(api::method_not_allowed),
        )
        .route(
            "/api/requests",
            get(api::requests).fallback(api::method_not_allowed),
        )
}

/// All routes, without middleware or state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(page_routes())
        .merge(submission_routes())
        .route("/dashboard", get(dashboard::index))
        .route("/age-gate", get(age_gate::show))
        .route("/age-gate/confirm", post(age_gate::confirm))
        .route("/age-gate/deny", post(age_gate::deny))
        .route("/age-gate/skip", post(age_gate::skip))
        .route("/cookies/consent", post(consent::save))
        .merge(api_routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(fallback)
}

/// The full application: routes, middleware and state.
///
/// Sentry layers are added by the binary. Serve with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the rate limiter
/// can fall back to the peer address.
pub fn router(state: AppState) -> Router {
    routes()
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header;

    use super::test_support::{VERIFIED, app, body_text, get, post_form, send};
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let response = send(app(), get("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_not_ready_before_first_refresh() {
        let response = send(app(), get("/health/ready", None)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_pages_are_age_gated() {
        for path in ["/", "/stores", "/products/live-rosin"] {
            let response = send(app(), get(path, None)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/age-gate");
        }
    }

    #[tokio::test]
    async fn test_submissions_are_keyed_by_peer_address() {
        let response = send(app(), post_form("/contact", "name=Ana", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!body_text(response).await.contains("Unable To Extract Key"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_page() {
        let response = send(app(), get("/nope", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("x-request-id").is_some());
        assert!(body_text(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_banner_until_consent_given() {
        let response = send(app(), get("/", Some(VERIFIED))).await;
        assert!(body_text(response).await.contains("id=\"cookie-banner\""));

        let consent = "dabs_cookie_consent=%7B%22necessary%22%3Atrue%2C%22functional%22%3Afalse%2C%22analytics%22%3Afalse%7D";
        let response = send(app(), get("/", Some(&format!("{VERIFIED}; {consent}")))).await;
        assert!(!body_text(response).await.contains("id=\"cookie-banner\""));
    }
}
