//! Age gate for page routes.
//!
//! Visitors without the age cookie are redirected to the gate. API routes,
//! static assets and the gate itself are not layered with this middleware.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use dabs_core::consent::is_age_verified;

use crate::cookies::VisitorCookies;

pub const AGE_GATE_PATH: &str = "/age-gate";

pub async fn age_gate_middleware(request: Request, next: Next) -> Response {
    let cookies = VisitorCookies::from_headers(request.headers());
    if is_age_verified(cookies.age_verified.as_deref()) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Redirecting unverified visitor");
    Redirect::to(AGE_GATE_PATH).into_response()
}
