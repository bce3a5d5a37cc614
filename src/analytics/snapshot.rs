//! Read-only views served by `GET /analytics`.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::counters::{top_entry, AnalyticsCounters, CounterMap};

/// Which view `GET /analytics?type=` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Donations,
    Visitors,
    Performance,
    Security,
    Summary,
}

impl SnapshotKind {
    /// Missing or unrecognised types fall back to the summary.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("donations") => SnapshotKind::Donations,
            Some("visitors") => SnapshotKind::Visitors,
            Some("performance") => SnapshotKind::Performance,
            Some("security") => SnapshotKind::Security,
            _ => SnapshotKind::Summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationsView {
    pub total_clicks: u64,
    pub today_clicks: u64,
    pub charities_clicked: CounterMap,
    pub category_clicks: CounterMap,
}

impl DonationsView {
    pub fn from_counters(counters: &AnalyticsCounters, today: NaiveDate) -> Self {
        let d = &counters.donations;
        Self {
            total_clicks: d.total_clicks,
            today_clicks: d.daily_clicks.on(today),
            charities_clicked: d.charities_clicked.clone(),
            category_clicks: d.category_clicks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorsView {
    pub total: u64,
    pub today: u64,
    pub countries: CounterMap,
    pub referrers: CounterMap,
}

impl VisitorsView {
    pub fn from_counters(counters: &AnalyticsCounters, today: NaiveDate) -> Self {
        let v = &counters.visitors;
        Self {
            total: v.total,
            today: v.daily.on(today),
            countries: v.countries.clone(),
            referrers: v.referrers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceView {
    pub total_requests: u64,
    pub average_response_ms: f64,
    pub server_error_rate: f64,
    pub uptime_secs: u64,
}

impl PerformanceView {
    pub fn from_counters(counters: &AnalyticsCounters, uptime: Duration) -> Self {
        let p = &counters.performance;
        Self {
            total_requests: p.requests,
            average_response_ms: p.average_response_ms(),
            server_error_rate: p.server_error_rate(),
            uptime_secs: uptime.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityView {
    pub blocked_requests: u64,
    pub rate_limit_hits: u64,
    pub cors_violations: u64,
    pub suspicious_ips: u64,
}

impl SecurityView {
    pub fn from_counters(counters: &AnalyticsCounters) -> Self {
        let s = &counters.security;
        Self {
            blocked_requests: s.blocked_requests,
            rate_limit_hits: s.rate_limit_hits,
            cors_violations: s.cors_violations,
            suspicious_ips: s.suspicious_ips,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayActivity {
    pub donation_clicks: u64,
    pub visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformHealth {
    pub average_response_ms: f64,
    pub server_error_rate: f64,
    pub security_incidents: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total_donation_clicks: u64,
    pub total_visitors: u64,
    pub today_activity: TodayActivity,
    /// `[id, clicks]` of the most clicked charity.
    pub top_charity: Option<(String, u64)>,
    /// `[category, clicks]` of the most clicked category.
    pub top_category: Option<(String, u64)>,
    pub platform_health: PlatformHealth,
}

impl SummaryView {
    pub fn from_counters(counters: &AnalyticsCounters, today: NaiveDate) -> Self {
        let owned = |entry: Option<(&str, u64)>| entry.map(|(k, v)| (k.to_string(), v));
        let s = &counters.security;
        Self {
            total_donation_clicks: counters.donations.total_clicks,
            total_visitors: counters.visitors.total,
            today_activity: TodayActivity {
                donation_clicks: counters.donations.daily_clicks.on(today),
                visitors: counters.visitors.daily.on(today),
            },
            top_charity: owned(top_entry(&counters.donations.charities_clicked)),
            top_category: owned(top_entry(&counters.donations.category_clicks)),
            platform_health: PlatformHealth {
                average_response_ms: counters.performance.average_response_ms(),
                server_error_rate: counters.performance.server_error_rate(),
                security_incidents: s.blocked_requests + s.rate_limit_hits + s.cors_violations,
            },
        }
    }
}
