//! Reading and writing the site's three cookies.
//!
//! The cookies are plain (unsigned) client state: the age flag, the
//! email-capture flag and the consent choice. Values follow the rules in
//! `dabs_core::consent`.

use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponseParts, ResponseParts};
use dabs_core::consent::{
    AGE_COOKIE_DAYS, AGE_VERIFIED_COOKIE, AGE_VERIFIED_VALUE, CONSENT_COOKIE, CONSENT_COOKIE_DAYS,
    Consent, EMAIL_CAPTURED_COOKIE,
};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};

/// Cookies the visitor sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorCookies {
    pub age_verified: Option<String>,
    pub email_captured: Option<String>,
    pub consent: Option<Consent>,
}

impl VisitorCookies {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::default();

        let raw = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());

        for line in raw {
            for cookie in Cookie::split_parse(line).filter_map(Result::ok) {
                match cookie.name() {
                    AGE_VERIFIED_COOKIE => cookies.age_verified = Some(cookie.value().to_string()),
                    EMAIL_CAPTURED_COOKIE => {
                        cookies.email_captured = Some(cookie.value().to_string());
                    }
                    CONSENT_COOKIE => cookies.consent = decode_consent(cookie.value()),
                    _ => {}
                }
            }
        }

        cookies
    }

    /// Whether the consent banner should be shown.
    #[must_use]
    pub const fn needs_consent(&self) -> bool {
        self.consent.is_none()
    }
}

fn decode_consent(raw: &str) -> Option<Consent> {
    let decoded = urlencoding::decode(raw).ok()?;
    Consent::from_json(&decoded)
}

/// Set-Cookie headers to attach to a response.
#[derive(Debug, Default)]
pub struct CookieUpdates {
    cookies: Vec<Cookie<'static>>,
}

impl CookieUpdates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, name: &'static str, value: String, days: i64) -> Self {
        self.cookies.push(
            Cookie::build((name, value))
                .path("/")
                .same_site(SameSite::Strict)
                .max_age(Duration::days(days))
                .build(),
        );
        self
    }

    #[must_use]
    pub fn age_verified(self) -> Self {
        self.set(AGE_VERIFIED_COOKIE, AGE_VERIFIED_VALUE.to_string(), AGE_COOKIE_DAYS)
    }

    #[must_use]
    pub fn email_captured(self, value: &'static str) -> Self {
        self.set(EMAIL_CAPTURED_COOKIE, value.to_string(), AGE_COOKIE_DAYS)
    }

    #[must_use]
    pub fn consent(self, consent: &Consent) -> Self {
        let value = urlencoding::encode(&consent.to_json()).into_owned();
        self.set(CONSENT_COOKIE, value, CONSENT_COOKIE_DAYS)
    }

    /// Expire a cookie.
    #[must_use]
    pub fn remove(mut self, name: &'static str) -> Self {
        let mut cookie = Cookie::build((name, "")).path("/").build();
        cookie.make_removal();
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl IntoResponseParts for CookieUpdates {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.cookies {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(name = cookie.name(), error = %e, "Unencodable cookie"),
            }
        }
        Ok(res)
    }
}
