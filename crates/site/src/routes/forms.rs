//! Contact and product-request forms.
//!
//! Both post form-encoded bodies and render a result page. Validation
//! failures re-state what was missing; downstream failures get a generic
//! message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Local;
use dabs_core::submission::{ContactSubmission, RequestSubmission, SubmissionError};
use tracing::instrument;

use super::Banner;
use crate::cookies::VisitorCookies;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "form_result.html")]
pub struct FormResultTemplate {
    pub banner: Banner,
    pub success: bool,
    pub title: &'static str,
    pub message: String,
    /// Where "Back" leads.
    pub back: &'static str,
}

struct FormPage {
    cookies: VisitorCookies,
    back: &'static str,
}

impl FormPage {
    fn render(&self, status: StatusCode, title: &'static str, message: String) -> Response {
        (
            status,
            FormResultTemplate {
                banner: Banner::new(&self.cookies, self.back),
                success: status.is_success(),
                title,
                message,
                back: self.back,
            },
        )
            .into_response()
    }

    fn invalid(&self, err: &SubmissionError) -> Response {
        tracing::debug!(error = %err, "Form rejected");
        self.render(StatusCode::BAD_REQUEST, "Please check the form", err.to_string())
    }
}

#[instrument(skip_all)]
pub async fn contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ContactSubmission>,
) -> Response {
    let page = FormPage {
        cookies: VisitorCookies::from_headers(&headers),
        back: "/#contact",
    };

    let message = match form.into_message(Local::now()) {
        Ok(message) => message,
        Err(e) => return page.invalid(&e),
    };

    let config = state.config();
    match state
        .forwarder()
        .forward(&config.contact_target, "contact", &message)
        .await
    {
        Ok(()) => {
            add_breadcrumb("contact", &message.subject);
            page.render(
                StatusCode::OK,
                "Message sent",
                "Thanks for reaching out! We'll get back to you soon.".to_string(),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Contact form forwarding failed");
            page.render(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Message not sent",
                format!(
                    "Sorry, something went wrong. Please email us directly at {}.",
                    config.contact_recipient
                ),
            )
        }
    }
}

#[instrument(skip_all)]
pub async fn request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RequestSubmission>,
) -> Response {
    let page = FormPage {
        cookies: VisitorCookies::from_headers(&headers),
        back: "/#request",
    };

    let Some(target) = state.config().request_target.as_ref() else {
        tracing::error!("Product request target not configured");
        return page.render(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Request not sent",
            "Requests are unavailable right now. Please try again later.".to_string(),
        );
    };

    let record = match form.into_record(Local::now()) {
        Ok(record) => record,
        Err(e) => return page.invalid(&e),
    };

    match state
        .forwarder()
        .forward(target, "product_request", &record)
        .await
    {
        Ok(()) => {
            add_breadcrumb("request", &format!("{} at {}", record.product, record.store));
            page.render(
                StatusCode::OK,
                "Request received",
                format!(
                    "Thanks! We'll let {} know you want {}.",
                    record.store, record.product
                ),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Product request forwarding failed");
            page.render(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Request not sent",
                "Failed to submit request. Please try again.".to_string(),
            )
        }
    }
}
