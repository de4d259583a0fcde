//! Product requests submitted by visitors ("bring Dabs to my store").

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of an optional contact field the visitor left blank.
pub const NOT_PROVIDED: &str = "Not provided";

/// Status stamped on every new request. Later statuses are edited by hand
/// in the sheet.
pub const DEFAULT_STATUS: &str = "New";

/// One row of the `ProductRequests` sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub timestamp: String,
    pub city: String,
    pub store: String,
    pub product: String,
    pub email: String,
    pub instagram: String,
    pub date: String,
    pub status: String,
}

impl RequestRecord {
    /// When the request was made.
    ///
    /// Prefers the ISO-8601 `timestamp`; falls back to the display `date`
    /// (`M/D/YYYY` or `YYYY-MM-DD`, taken as midnight UTC).
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(self.timestamp.trim()) {
            return Some(ts.with_timezone(&Utc));
        }

        parse_display_date(&self.date)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// The email, unless the visitor left it blank.
    #[must_use]
    pub fn provided_email(&self) -> Option<&str> {
        provided(&self.email)
    }

    /// The Instagram handle without a leading `@`, unless left blank.
    #[must_use]
    pub fn instagram_handle(&self) -> Option<&str> {
        provided(&self.instagram).map(|h| h.trim_start_matches('@'))
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.status == DEFAULT_STATUS
    }
}

fn provided(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != NOT_PROVIDED).then_some(value)
}

fn parse_display_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
pub(crate) fn sample_request(city: &str, store: &str, product: &str) -> RequestRecord {
    RequestRecord {
        timestamp: "2025-03-15T12:00:00.000Z".to_string(),
        city: city.to_string(),
        store: store.to_string(),
        product: product.to_string(),
        email: NOT_PROVIDED.to_string(),
        instagram: NOT_PROVIDED.to_string(),
        date: "3/15/2025".to_string(),
        status: DEFAULT_STATUS.to_string(),
    }
}
