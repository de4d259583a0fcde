//! Age gate and the optional newsletter step that follows it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use dabs_core::consent::{self, AgeGateStep, EmailCapture};
use dabs_core::submission::EmailSignup;
use tracing::instrument;

use super::Banner;
use crate::cookies::{CookieUpdates, VisitorCookies};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::AGE_GATE_PATH;
use crate::state::AppState;

/// Seconds the signup confirmation stays up before entering the site.
pub const WELCOME_REDIRECT_SECS: u32 = 2;

#[derive(Template, WebTemplate)]
#[template(path = "age_gate.html")]
pub struct AgeGateTemplate {
    pub banner: Banner,
    pub step: AgeGateStep,
    /// Signup accepted; shown in place of the email form.
    pub subscribed: bool,
    pub email: String,
    pub error: Option<String>,
    pub redirect_secs: u32,
}

impl AgeGateTemplate {
    fn new(cookies: &VisitorCookies, step: AgeGateStep) -> Self {
        Self {
            banner: Banner::new(cookies, AGE_GATE_PATH),
            step,
            subscribed: false,
            email: String::new(),
            error: None,
            redirect_secs: WELCOME_REDIRECT_SECS,
        }
    }
}

fn enter_site(updates: CookieUpdates) -> Response {
    (updates, Redirect::to("/")).into_response()
}

#[instrument(skip_all)]
pub async fn show(headers: HeaderMap) -> Response {
    let cookies = VisitorCookies::from_headers(&headers);

    match consent::initial_step(cookies.age_verified.as_deref()) {
        AgeGateStep::Enter => Redirect::to("/").into_response(),
        step => AgeGateTemplate::new(&cookies, step).into_response(),
    }
}

#[instrument(skip_all)]
pub async fn confirm(headers: HeaderMap) -> Response {
    let cookies = VisitorCookies::from_headers(&headers);
    let updates = CookieUpdates::new().age_verified();
    add_breadcrumb("age_gate", "confirmed");

    match consent::after_confirm(cookies.email_captured.as_deref(), cookies.consent.as_ref()) {
        AgeGateStep::Enter => enter_site(updates),
        step => (updates, AgeGateTemplate::new(&cookies, step)).into_response(),
    }
}

#[instrument(skip_all)]
pub async fn deny(headers: HeaderMap) -> Response {
    let cookies = VisitorCookies::from_headers(&headers);
    AgeGateTemplate::new(&cookies, AgeGateStep::UnderAge).into_response()
}

#[instrument(skip_all)]
pub async fn email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EmailSignup>,
) -> Response {
    let cookies = VisitorCookies::from_headers(&headers);
    let entered = form.email.clone().unwrap_or_default();

    let retry = |status: StatusCode, error: String| {
        let mut page = AgeGateTemplate::new(&cookies, AgeGateStep::EmailCapture);
        page.email.clone_from(&entered);
        page.error = Some(error);
        (status, page).into_response()
    };

    let record = match form.into_record(Utc::now()) {
        Ok(record) => record,
        Err(e) => return retry(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if let Err(e) = state
        .forwarder()
        .forward(&state.config().signup_target, "signup", &record)
        .await
    {
        tracing::error!(error = %e, "Signup forwarding failed");
        return retry(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again.".to_string(),
        );
    }

    add_breadcrumb("age_gate", "subscribed");
    let updates = match EmailCapture::Subscribed.remembered(cookies.consent.as_ref()) {
        Some(value) => CookieUpdates::new().email_captured(value),
        None => CookieUpdates::new(),
    };

    let mut page = AgeGateTemplate::new(&cookies, AgeGateStep::EmailCapture);
    page.subscribed = true;
    (updates, page).into_response()
}

#[instrument(skip_all)]
pub async fn skip(headers: HeaderMap) -> Response {
    let cookies = VisitorCookies::from_headers(&headers);
    let updates = match EmailCapture::Skipped.remembered(cookies.consent.as_ref()) {
        Some(value) => CookieUpdates::new().email_captured(value),
        None => CookieUpdates::new(),
    };
    enter_site(updates)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::header;

    use super::*;
    use crate::routes::test_support::*;

    const FUNCTIONAL_OK: &str = "dabs_cookie_consent=%7B%22necessary%22%3Atrue%2C%22functional%22%3Atrue%2C%22analytics%22%3Afalse%7D";

    #[tokio::test]
    async fn test_gate_shows_question() {
        let response = send(app(), get("/age-gate", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("21 or older"));
    }

    #[tokio::test]
    async fn test_verified_visitor_skips_gate() {
        let response = send(app(), get("/age-gate", Some(VERIFIED))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_confirm_sets_cookie_and_asks_for_email() {
        let response = send(app(), post_form("/age-gate/confirm", "", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = set_cookies(&response);
        assert!(cookies[0].starts_with("dabs_age_verified=true"));
        assert!(body_text(response).await.contains("name=\"email\""));
    }

    #[tokio::test]
    async fn test_confirm_enters_when_capture_remembered() {
        let cookie = format!("dabs_email_captured=true; {FUNCTIONAL_OK}");
        let response = send(app(), post_form("/age-gate/confirm", "", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(set_cookies(&response).len(), 1);
    }

    #[tokio::test]
    async fn test_capture_ignored_without_functional_consent() {
        let response = send(
            app(),
            post_form("/age-gate/confirm", "", Some("dabs_email_captured=true")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deny_shows_notice() {
        let response = send(app(), post_form("/age-gate/deny", "", None)).await;
        assert!(body_text(response).await.contains("must be 21"));
    }

    #[tokio::test]
    async fn test_email_requires_consent_box() {
        let response = send(app(), post_form("/age-gate/email", "email=a%40b.co", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_text(response)
                .await
                .contains("Please check the consent box to subscribe.")
        );
    }

    #[tokio::test]
    async fn test_email_remembered_only_with_functional_consent() {
        let body = "email=a%40b.co&consent_marketing=on";

        let response = send(app(), post_form("/age-gate/email", body, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());

        let response = send(app(), post_form("/age-gate/email", body, Some(FUNCTIONAL_OK))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies[0].starts_with("dabs_email_captured=true"));
        assert!(body_text(response).await.contains("http-equiv=\"refresh\""));
    }

    #[tokio::test]
    async fn test_skip_remembers_when_allowed() {
        let response = send(app(), post_form("/age-gate/skip", "", Some(FUNCTIONAL_OK))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(set_cookies(&response)[0].starts_with("dabs_email_captured=skipped"));

        let response = send(app(), post_form("/age-gate/skip", "", None)).await;
        assert!(set_cookies(&response).is_empty());
    }
}
