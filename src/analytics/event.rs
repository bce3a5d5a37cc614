//! Analytics events accepted by `POST /analytics`.

use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /analytics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRequest {
    pub event: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Sub-type of a `security_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    BlockedRequest,
    RateLimit,
    CorsViolation,
}

impl SecurityEventKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "blocked_request" => Some(SecurityEventKind::BlockedRequest),
            "rate_limit" => Some(SecurityEventKind::RateLimit),
            "cors_violation" => Some(SecurityEventKind::CorsViolation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::BlockedRequest => "blocked_request",
            SecurityEventKind::RateLimit => "rate_limit",
            SecurityEventKind::CorsViolation => "cors_violation",
        }
    }
}

/// A parsed analytics event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    DonationClick {
        charity_id: Option<String>,
        category: Option<String>,
    },
    PageView {
        country: Option<String>,
        referrer: Option<String>,
    },
    Security {
        kind: Option<SecurityEventKind>,
    },
    /// Accepted and acknowledged, but counts nothing.
    Unknown(String),
}

impl AnalyticsEvent {
    /// Interpret an event name and its optional payload.
    pub fn parse(name: &str, data: Option<&Value>) -> Self {
        let field = |key: &str| {
            data.and_then(|d| d.get(key))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match name {
            "donation_click" => AnalyticsEvent::DonationClick {
                charity_id: field("charityId"),
                category: field("category"),
            },
            "page_view" => AnalyticsEvent::PageView {
                country: field("country"),
                referrer: field("referrer"),
            },
            "security_event" => AnalyticsEvent::Security {
                kind: field("type").as_deref().and_then(SecurityEventKind::from_tag),
            },
            other => AnalyticsEvent::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnalyticsEvent::DonationClick { .. } => "donation_click",
            AnalyticsEvent::PageView { .. } => "page_view",
            AnalyticsEvent::Security { .. } => "security_event",
            AnalyticsEvent::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_donation_click_payload() {
        let data = json!({"charityId": "islamic-relief", "category": "Emergency Aid"});
        assert_eq!(
            AnalyticsEvent::parse("donation_click", Some(&data)),
            AnalyticsEvent::DonationClick {
                charity_id: Some("islamic-relief".into()),
                category: Some("Emergency Aid".into()),
            }
        );
    }

    #[test]
    fn blank_and_non_string_fields_are_absent() {
        let data = json!({"country": "  ", "referrer": 42});
        assert_eq!(
            AnalyticsEvent::parse("page_view", Some(&data)),
            AnalyticsEvent::PageView {
                country: None,
                referrer: None,
            }
        );
        assert_eq!(
            AnalyticsEvent::parse("page_view", None),
            AnalyticsEvent::PageView {
                country: None,
                referrer: None,
            }
        );
    }

    #[test]
    fn security_sub_types() {
        let data = json!({"type": "cors_violation"});
        assert_eq!(
            AnalyticsEvent::parse("security_event", Some(&data)),
            AnalyticsEvent::Security {
                kind: Some(SecurityEventKind::CorsViolation)
            }
        );
        let data = json!({"type": "port_scan"});
        assert_eq!(
            AnalyticsEvent::parse("security_event", Some(&data)),
            AnalyticsEvent::Security { kind: None }
        );
    }

    #[test]
    fn unknown_names_are_kept() {
        let event = AnalyticsEvent::parse("newsletter_signup", None);
        assert_eq!(event, AnalyticsEvent::Unknown("newsletter_signup".into()));
        assert_eq!(event.name(), "newsletter_signup");
    }
}
