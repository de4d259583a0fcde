//! Cookie consent and age-gate rules.
//!
//! Only decisions live here; reading and writing the actual cookies is the
//! site's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const AGE_VERIFIED_COOKIE: &str = "dabs_age_verified";
pub const EMAIL_CAPTURED_COOKIE: &str = "dabs_email_captured";
pub const CONSENT_COOKIE: &str = "dabs_cookie_consent";

pub const AGE_COOKIE_DAYS: i64 = 30;
pub const CONSENT_COOKIE_DAYS: i64 = 365;

/// Cookies dropped when functional consent is withdrawn.
pub const NON_ESSENTIAL_COOKIES: &[&str] = &[EMAIL_CAPTURED_COOKIE];

/// Value stored in the age cookie once the visitor confirms they are 21+.
pub const AGE_VERIFIED_VALUE: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieCategory {
    Necessary,
    Functional,
    Analytics,
}

impl CookieCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Necessary => "necessary",
            Self::Functional => "functional",
            Self::Analytics => "analytics",
        }
    }
}

impl fmt::Display for CookieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CookieCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "necessary" => Ok(Self::Necessary),
            "functional" => Ok(Self::Functional),
            "analytics" => Ok(Self::Analytics),
            other => Err(format!("unknown cookie category: {other}")),
        }
    }
}

/// Stored consent, serialized as JSON into [`CONSENT_COOKIE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    pub necessary: bool,
    #[serde(default)]
    pub functional: bool,
    #[serde(default)]
    pub analytics: bool,
}

impl Consent {
    #[must_use]
    pub const fn accept_all() -> Self {
        Self {
            necessary: true,
            functional: true,
            analytics: true,
        }
    }

    #[must_use]
    pub const fn reject_all() -> Self {
        Self::custom(false, false)
    }

    #[must_use]
    pub const fn custom(functional: bool, analytics: bool) -> Self {
        Self {
            necessary: true,
            functional,
            analytics,
        }
    }

    #[must_use]
    pub const fn allows(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Necessary => true,
            CookieCategory::Functional => self.functional,
            CookieCategory::Analytics => self.analytics,
        }
    }

    /// Parse the decoded cookie value. Garbage reads as "no choice yet".
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        // A struct of three bools always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Whether `category` may be used given the visitor's stored choice.
/// Without a choice only necessary cookies are allowed.
#[must_use]
pub fn is_allowed(consent: Option<&Consent>, category: CookieCategory) -> bool {
    match consent {
        Some(c) => c.allows(category),
        None => category == CookieCategory::Necessary,
    }
}

/// A banner or preferences-modal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentChoice {
    AcceptAll,
    RejectAll,
    Save { functional: bool, analytics: bool },
}

/// What to write back after a [`ConsentChoice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentOutcome {
    pub consent: Consent,
    pub remove: &'static [&'static str],
}

impl ConsentChoice {
    #[must_use]
    pub const fn apply(self) -> ConsentOutcome {
        let consent = match self {
            Self::AcceptAll => Consent::accept_all(),
            Self::RejectAll => Consent::reject_all(),
            Self::Save {
                functional,
                analytics,
            } => Consent::custom(functional, analytics),
        };

        let remove: &'static [&'static str] = if consent.functional {
            &[]
        } else {
            NON_ESSENTIAL_COOKIES
        };

        ConsentOutcome { consent, remove }
    }
}

/// Outcome of the email step, stored in [`EMAIL_CAPTURED_COOKIE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailCapture {
    Subscribed,
    Skipped,
}

impl EmailCapture {
    #[must_use]
    pub const fn cookie_value(self) -> &'static str {
        match self {
            Self::Subscribed => "true",
            Self::Skipped => "skipped",
        }
    }

    /// The cookie value to set, or `None` when functional cookies are off.
    #[must_use]
    pub fn remembered(self, consent: Option<&Consent>) -> Option<&'static str> {
        is_allowed(consent, CookieCategory::Functional).then_some(self.cookie_value())
    }
}

/// Screen the age gate shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGateStep {
    /// "Are you 21 or older?"
    Verify,
    /// Optional newsletter signup after confirming age.
    EmailCapture,
    UnderAge,
    /// Straight through to the site.
    Enter,
}

#[must_use]
pub fn is_age_verified(cookie: Option<&str>) -> bool {
    cookie == Some(AGE_VERIFIED_VALUE)
}

/// First screen for a visitor arriving at the gate.
#[must_use]
pub fn initial_step(age_cookie: Option<&str>) -> AgeGateStep {
    if is_age_verified(age_cookie) {
        AgeGateStep::Enter
    } else {
        AgeGateStep::Verify
    }
}

/// Screen after the visitor confirms their age. The email step is skipped
/// only when a capture was remembered and functional cookies are allowed.
#[must_use]
pub fn after_confirm(email_cookie: Option<&str>, consent: Option<&Consent>) -> AgeGateStep {
    let remembered = is_allowed(consent, CookieCategory::Functional)
        && email_cookie.is_some_and(|v| !v.is_empty());

    if remembered {
        AgeGateStep::Enter
    } else {
        AgeGateStep::EmailCapture
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_necessary_always_allowed() {
        assert!(is_allowed(None, CookieCategory::Necessary));
        assert!(!is_allowed(None, CookieCategory::Functional));
        assert!(is_allowed(
            Some(&Consent::reject_all()),
            CookieCategory::Necessary
        ));
    }

    #[test]
    fn test_consent_json_shape() {
        let json = Consent::custom(true, false).to_json();
        assert_eq!(
            json,
            r#"{"necessary":true,"functional":true,"analytics":false}"#
        );
        assert_eq!(Consent::from_json(&json), Some(Consent::custom(true, false)));
        assert_eq!(Consent::from_json("{nope"), None);
    }

    #[test]
    fn test_reject_removes_email_cookie() {
        let outcome = ConsentChoice::RejectAll.apply();
        assert!(!outcome.consent.functional);
        assert_eq!(outcome.remove, &[EMAIL_CAPTURED_COOKIE]);

        let outcome = ConsentChoice::AcceptAll.apply();
        assert!(outcome.consent.analytics);
        assert!(outcome.remove.is_empty());

        let outcome = ConsentChoice::Save {
            functional: true,
            analytics: false,
        }
        .apply();
        assert!(outcome.remove.is_empty());
        assert!(!outcome.consent.analytics);
    }

    #[test]
    fn test_initial_step() {
        assert_eq!(initial_step(Some("true")), AgeGateStep::Enter);
        assert_eq!(initial_step(Some("false")), AgeGateStep::Verify);
        assert_eq!(initial_step(None), AgeGateStep::Verify);
    }

    #[test]
    fn test_after_confirm_needs_functional_consent() {
        let all = Consent::accept_all();
        let none = Consent::reject_all();

        assert_eq!(after_confirm(Some("true"), Some(&all)), AgeGateStep::Enter);
        assert_eq!(after_confirm(Some("skipped"), Some(&all)), AgeGateStep::Enter);
        assert_eq!(
            after_confirm(Some("true"), Some(&none)),
            AgeGateStep::EmailCapture
        );
        assert_eq!(after_confirm(Some("true"), None), AgeGateStep::EmailCapture);
        assert_eq!(after_confirm(None, Some(&all)), AgeGateStep::EmailCapture);
    }

    #[test]
    fn test_email_capture_only_remembered_with_consent() {
        let all = Consent::accept_all();
        assert_eq!(EmailCapture::Subscribed.remembered(Some(&all)), Some("true"));
        assert_eq!(EmailCapture::Skipped.remembered(Some(&all)), Some("skipped"));
        assert_eq!(EmailCapture::Subscribed.remembered(None), None);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "functional".parse::<CookieCategory>().unwrap(),
            CookieCategory::Functional
        );
        assert!("marketing".parse::<CookieCategory>().is_err());
    }
}
