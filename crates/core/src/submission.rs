//! Validation and defaulting for visitor submissions.
//!
//! Each inbound form is deserialized loosely (every field optional), then
//! validated into the record that is forwarded downstream. Validation never
//! touches the network.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DEFAULT_STATUS, Email, EmailError, NOT_PROVIDED, RequestRecord};

/// Page label stamped on contact messages.
pub const CONTACT_PAGE: &str = "Main Website Contact Form";
/// Source label stamped on age-gate signups.
pub const SIGNUP_SOURCE: &str = "age_gate";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Please check the consent box to subscribe.")]
    ConsentRequired,
}

/// `2025-03-15T12:00:00.000Z`.
#[must_use]
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `3/15/2025`.
#[must_use]
pub fn display_date(now: &DateTime<Local>) -> String {
    now.format("%-m/%-d/%Y").to_string()
}

/// `3/15/2025, 2:05:09 PM`.
#[must_use]
pub fn display_date_time(now: &DateTime<Local>) -> String {
    now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn or_not_provided(value: Option<&String>) -> String {
    present(value).unwrap_or(NOT_PROVIDED).to_string()
}

/// Collects the names of required fields that are missing.
struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    const fn new() -> Self {
        Self {
            missing: Vec::new(),
        }
    }

    fn take<'a>(&mut self, name: &'static str, value: Option<&'a String>) -> &'a str {
        present(value).unwrap_or_else(|| {
            self.missing.push(name);
            ""
        })
    }

    fn finish(self) -> Result<(), SubmissionError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(SubmissionError::MissingFields(self.missing))
        }
    }
}

/// Body of `POST /api/request` and the product-request form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestSubmission {
    pub city: Option<String>,
    pub store: Option<String>,
    pub product: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub timestamp: Option<String>,
    pub date: Option<String>,
}

impl RequestSubmission {
    /// Validate and fill server defaults. `status` is always [`DEFAULT_STATUS`].
    ///
    /// # Errors
    ///
    /// [`SubmissionError::MissingFields`] when city, store or product is
    /// absent or blank.
    pub fn into_record(self, now: DateTime<Local>) -> Result<RequestRecord, SubmissionError> {
        let mut required = Required::new();
        let city = required.take("city", self.city.as_ref()).to_string();
        let store = required.take("store", self.store.as_ref()).to_string();
        let product = required.take("product", self.product.as_ref()).to_string();
        required.finish()?;

        let timestamp = present(self.timestamp.as_ref())
            .map_or_else(|| iso_timestamp(now.with_timezone(&Utc)), str::to_string);
        let date = present(self.date.as_ref())
            .map_or_else(|| display_date(&now), str::to_string);

        Ok(RequestRecord {
            timestamp,
            city,
            store,
            product,
            email: or_not_provided(self.email.as_ref()),
            instagram: or_not_provided(self.instagram.as_ref()),
            date,
            status: DEFAULT_STATUS.to_string(),
        })
    }
}

/// Body of the contact form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// A contact message as forwarded downstream.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub timestamp: String,
    pub date: String,
    pub page: String,
}

impl ContactSubmission {
    /// # Errors
    ///
    /// [`SubmissionError::MissingFields`] for blank name, email, subject or
    /// message; [`SubmissionError::InvalidEmail`] when the email does not
    /// parse.
    pub fn into_message(self, now: DateTime<Local>) -> Result<ContactMessage, SubmissionError> {
        let mut required = Required::new();
        let name = required.take("name", self.name.as_ref()).to_string();
        let email = required.take("email", self.email.as_ref()).to_string();
        let subject = required.take("subject", self.subject.as_ref()).to_string();
        let message = required.take("message", self.message.as_ref()).to_string();
        required.finish()?;

        Ok(ContactMessage {
            name,
            email: Email::parse(&email)?,
            phone: or_not_provided(self.phone.as_ref()),
            subject,
            message,
            timestamp: iso_timestamp(now.with_timezone(&Utc)),
            date: display_date_time(&now),
            page: CONTACT_PAGE.to_string(),
        })
    }
}

/// Body of the age-gate email step. The checkbox arrives as `"on"` when ticked.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EmailSignup {
    pub email: Option<String>,
    pub consent_marketing: Option<String>,
}

/// A newsletter signup as forwarded downstream.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignupRecord {
    pub email: Email,
    pub consent_marketing: bool,
    pub consent_age: bool,
    pub timestamp: String,
    pub source: String,
}

impl EmailSignup {
    fn consented(&self) -> bool {
        present(self.consent_marketing.as_ref())
            .is_some_and(|v| !matches!(v, "false" | "off" | "0"))
    }

    /// # Errors
    ///
    /// Missing or malformed email, or the marketing box left unticked.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<SignupRecord, SubmissionError> {
        let mut required = Required::new();
        let email = required.take("email", self.email.as_ref()).to_string();
        required.finish()?;
        let email = Email::parse(&email)?;

        if !self.consented() {
            return Err(SubmissionError::ConsentRequired);
        }

        Ok(SignupRecord {
            email,
            consent_marketing: true,
            consent_age: true,
            timestamp: iso_timestamp(now),
            source: SIGNUP_SOURCE.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn full_request() -> RequestSubmission {
        RequestSubmission {
            city: Some("Portland".to_string()),
            store: Some("Green Leaf".to_string()),
            product: Some("Live Rosin".to_string()),
            ..RequestSubmission::default()
        }
    }

    #[test]
    fn test_missing_contact_fields_become_not_provided() {
        let record = full_request().into_record(noon()).unwrap();
        assert_eq!(record.email, NOT_PROVIDED);
        assert_eq!(record.instagram, NOT_PROVIDED);
        assert_eq!(record.status, DEFAULT_STATUS);

        let blank = RequestSubmission {
            email: Some("   ".to_string()),
            ..full_request()
        };
        assert_eq!(blank.into_record(noon()).unwrap().email, NOT_PROVIDED);
    }

    #[test]
    fn test_server_stamps() {
        let record = full_request().into_record(noon()).unwrap();
        assert_eq!(record.date, "3/15/2025");
        assert!(record.timestamp.ends_with(".000Z"), "{}", record.timestamp);
        assert_eq!(
            record.submitted_at().unwrap(),
            noon().with_timezone(&Utc)
        );
    }

    #[test]
    fn test_client_stamps_are_kept() {
        let submission = RequestSubmission {
            timestamp: Some("2024-12-01T08:00:00.000Z".to_string()),
            date: Some("12/1/2024".to_string()),
            ..full_request()
        };
        let record = submission.into_record(noon()).unwrap();
        assert_eq!(record.timestamp, "2024-12-01T08:00:00.000Z");
        assert_eq!(record.date, "12/1/2024");
    }

    #[test]
    fn test_missing_required_fields_listed() {
        let submission = RequestSubmission {
            store: Some(" ".to_string()),
            product: None,
            ..full_request()
        };
        let err = submission.into_record(noon()).unwrap_err();
        assert_eq!(err, SubmissionError::MissingFields(vec!["store", "product"]));
        assert_eq!(err.to_string(), "Missing required fields: store, product");
    }

    #[test]
    fn test_request_body_accepts_partial_json() {
        let submission: RequestSubmission =
            serde_json::from_str(r#"{"city":"Bend","store":"Mountain High"}"#).unwrap();
        assert!(submission.into_record(noon()).is_err());
    }

    #[test]
    fn test_contact_defaults() {
        let contact = ContactSubmission {
            name: Some("Sam".to_string()),
            email: Some("Sam@Example.com".to_string()),
            phone: None,
            subject: Some("wholesale".to_string()),
            message: Some("Do you ship to Bend?".to_string()),
        };
        let message = contact.into_message(noon()).unwrap();
        assert_eq!(message.phone, NOT_PROVIDED);
        assert_eq!(message.page, CONTACT_PAGE);
        assert_eq!(message.email.as_str(), "sam@example.com");
        assert_eq!(message.date, "3/15/2025, 12:00:00 PM");
    }

    #[test]
    fn test_contact_rejects_bad_email() {
        let contact = ContactSubmission {
            name: Some("Sam".to_string()),
            email: Some("sam-at-example".to_string()),
            subject: Some("hi".to_string()),
            message: Some("hello".to_string()),
            ..ContactSubmission::default()
        };
        assert_eq!(
            contact.into_message(noon()).unwrap_err(),
            SubmissionError::InvalidEmail(EmailError::MissingAtSymbol)
        );
    }

    #[test]
    fn test_signup_requires_consent() {
        let signup = EmailSignup {
            email: Some("fan@example.com".to_string()),
            consent_marketing: None,
        };
        assert_eq!(
            signup.into_record(Utc::now()).unwrap_err(),
            SubmissionError::ConsentRequired
        );
    }

    #[test]
    fn test_signup_wire_shape() {
        let signup = EmailSignup {
            email: Some("fan@example.com".to_string()),
            consent_marketing: Some("on".to_string()),
        };
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let json = serde_json::to_value(signup.into_record(now).unwrap()).unwrap();
        assert_eq!(json["email"], "fan@example.com");
        assert_eq!(json["consentMarketing"], true);
        assert_eq!(json["consentAge"], true);
        assert_eq!(json["source"], "age_gate");
        assert_eq!(json["timestamp"], "2025-03-15T12:00:00.000Z");
    }
}
