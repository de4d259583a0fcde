//! Cookie consent banner and preferences.

use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use dabs_core::consent::ConsentChoice;
use serde::Deserialize;
use tracing::instrument;

use crate::cookies::CookieUpdates;
use crate::error::{AppError, add_breadcrumb};

#[derive(Debug, Default, Deserialize)]
pub struct ConsentForm {
    /// `accept_all`, `reject_all` or `save`.
    pub action: String,
    /// Checkboxes arrive only when ticked.
    pub functional: Option<String>,
    pub analytics: Option<String>,
    pub return_to: Option<String>,
}

impl ConsentForm {
    fn choice(&self) -> Option<ConsentChoice> {
        match self.action.as_str() {
            "accept_all" => Some(ConsentChoice::AcceptAll),
            "reject_all" => Some(ConsentChoice::RejectAll),
            "save" => Some(ConsentChoice::Save {
                functional: self.functional.is_some(),
                analytics: self.analytics.is_some(),
            }),
            _ => None,
        }
    }

    /// Local path to go back to; anything else falls back to `/`.
    fn return_to(&self) -> &str {
        self.return_to
            .as_deref()
            .filter(|path| {
                path.starts_with('/')
                    && !path.starts_with("//")
                    && !path.contains('\\')
                    && !path.chars().any(char::is_control)
            })
            .unwrap_or("/")
    }
}

#[instrument(skip_all, fields(action = %form.action))]
pub async fn save(Form(form): Form<ConsentForm>) -> Result<Response, AppError> {
    let choice = form.choice().ok_or(AppError::InvalidBody)?;
    let outcome = choice.apply();
    add_breadcrumb("consent", &form.action);

    let updates = outcome
        .remove
        .iter()
        .fold(CookieUpdates::new().consent(&outcome.consent), |updates, &name| {
            updates.remove(name)
        });

    Ok((updates, Redirect::to(form.return_to())).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::{StatusCode, header};
    use dabs_core::consent::Consent;

    use super::*;
    use crate::routes::test_support::*;

    fn consent_cookie(cookies: &[String]) -> Consent {
        let raw = cookies[0]
            .strip_prefix("dabs_cookie_consent=")
            .unwrap()
            .split(';')
            .next()
            .unwrap();
        Consent::from_json(&urlencoding::decode(raw).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_accept_all() {
        let response = send(
            app(),
            post_form("/cookies/consent", "action=accept_all&return_to=%2Fstores", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/stores");

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert_eq!(consent_cookie(&cookies), Consent::accept_all());
        assert!(cookies[0].contains("Max-Age=31536000"));
    }

    #[tokio::test]
    async fn test_return_to_with_line_break_goes_home() {
        let response = send(
            app(),
            post_form("/cookies/consent", "action=accept_all&return_to=%2Fstores%0Ax", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_reject_removes_capture_cookie() {
        let response = send(app(), post_form("/cookies/consent", "action=reject_all", None)).await;

        let cookies = set_cookies(&response);
        assert_eq!(consent_cookie(&cookies), Consent::reject_all());
        assert!(cookies[1].starts_with("dabs_email_captured="));
        assert!(cookies[1].contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_save_preferences() {
        let response = send(
            app(),
            post_form("/cookies/consent", "action=save&analytics=on", None),
        )
        .await;

        let cookies = set_cookies(&response);
        assert_eq!(consent_cookie(&cookies), Consent::custom(false, true));
        assert_eq!(cookies.len(), 2);
    }

    #[tokio::test]
    async fn test_offsite_return_is_ignored() {
        let response = send(
            app(),
            post_form(
                "/cookies/consent",
                "action=accept_all&return_to=%2F%2Fevil.example",
                None,
            ),
        )
        .await;
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_unknown_action_is_400() {
        let response = send(app(), post_form("/cookies/consent", "action=maybe", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
