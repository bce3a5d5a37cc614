//! The analytics counter tree.
//!
//! Every counter only ever increases. Per-day counts are kept per UTC
//! calendar day, so "today" restarts at zero without any value going down.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;

use crate::analytics::event::{AnalyticsEvent, SecurityEventKind};
use crate::config::{AnalyticsConfig, UnknownKeyPolicy};

/// Named counters keyed by charity id, category, country or referrer.
pub type CounterMap = BTreeMap<String, u64>;

/// How counter maps treat keys they have not seen before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRules {
    pub unknown: UnknownKeyPolicy,
    /// Keys one map may hold. Existing keys keep counting past it.
    pub max_keys: usize,
}

impl KeyRules {
    pub const DEFAULT_MAX_KEYS: usize = 256;

    pub fn new(unknown: UnknownKeyPolicy) -> Self {
        Self {
            unknown,
            max_keys: Self::DEFAULT_MAX_KEYS,
        }
    }
}

impl From<&AnalyticsConfig> for KeyRules {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            unknown: config.unknown_keys,
            max_keys: config.max_counter_keys,
        }
    }
}

/// Counts bucketed by calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyCounter(BTreeMap<NaiveDate, u64>);

impl DailyCounter {
    pub fn increment(&mut self, day: NaiveDate) {
        *self.0.entry(day).or_insert(0) += 1;
    }

    pub fn on(&self, day: NaiveDate) -> u64 {
        self.0.get(&day).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationCounters {
    pub total_clicks: u64,
    pub daily_clicks: DailyCounter,
    pub charities_clicked: CounterMap,
    pub category_clicks: CounterMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorCounters {
    pub total: u64,
    pub daily: DailyCounter,
    pub countries: CounterMap,
    pub referrers: CounterMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityCounters {
    pub blocked_requests: u64,
    pub rate_limit_hits: u64,
    pub cors_violations: u64,
    pub suspicious_ips: u64,
}

/// Served-request statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceCounters {
    pub requests: u64,
    pub total_latency_micros: u64,
    pub server_errors: u64,
}

impl PerformanceCounters {
    pub fn average_response_ms(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.total_latency_micros as f64 / self.requests as f64 / 1000.0
    }

    pub fn server_error_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.server_errors as f64 / self.requests as f64
    }
}

/// All counters of one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsCounters {
    pub donations: DonationCounters,
    pub visitors: VisitorCounters,
    pub security: SecurityCounters,
    pub performance: PerformanceCounters,
}

impl AnalyticsCounters {
    /// Apply one event. Returns whether any counter changed.
    pub fn apply(&mut self, event: &AnalyticsEvent, day: NaiveDate, rules: KeyRules) -> bool {
        match event {
            AnalyticsEvent::DonationClick {
                charity_id: Some(charity_id),
                category,
            } => {
                let donations = &mut self.donations;
                donations.total_clicks += 1;
                donations.daily_clicks.increment(day);
                bump(&mut donations.charities_clicked, "charities_clicked", charity_id, rules);
                if let Some(category) = category {
                    bump(&mut donations.category_clicks, "category_clicks", category, rules);
                }
                true
            }
            AnalyticsEvent::DonationClick { charity_id: None, .. } => false,
            AnalyticsEvent::PageView { country, referrer } => {
                let visitors = &mut self.visitors;
                visitors.total += 1;
                visitors.daily.increment(day);
                if let Some(country) = country {
                    bump(&mut visitors.countries, "countries", country, rules);
                }
                if let Some(referrer) = referrer {
                    bump(&mut visitors.referrers, "referrers", referrer, rules);
                }
                true
            }
            AnalyticsEvent::Security { kind: Some(kind) } => {
                self.record_security(*kind);
                true
            }
            AnalyticsEvent::Security { kind: None } | AnalyticsEvent::Unknown(_) => false,
        }
    }

    pub fn record_security(&mut self, kind: SecurityEventKind) {
        let security = &mut self.security;
        match kind {
            SecurityEventKind::BlockedRequest => security.blocked_requests += 1,
            SecurityEventKind::RateLimit => security.rate_limit_hits += 1,
            SecurityEventKind::CorsViolation => security.cors_violations += 1,
        }
    }

    pub fn record_request(&mut self, latency: Duration, server_error: bool) {
        let perf = &mut self.performance;
        perf.requests += 1;
        perf.total_latency_micros = perf
            .total_latency_micros
            .saturating_add(latency.as_micros().min(u64::MAX as u128) as u64);
        if server_error {
            perf.server_errors += 1;
        }
    }
}

/// Increment `key`, creating it only when the rules allow.
fn bump(map: &mut CounterMap, counter: &'static str, key: &str, rules: KeyRules) -> bool {
    if let Some(count) = map.get_mut(key) {
        *count += 1;
        return true;
    }
    match rules.unknown {
        UnknownKeyPolicy::Insert if map.len() < rules.max_keys => {
            map.insert(key.to_string(), 1);
            true
        }
        UnknownKeyPolicy::Insert => {
            tracing::warn!(
                counter,
                max_keys = rules.max_keys,
                "Counter key limit reached, dropping new key"
            );
            false
        }
        UnknownKeyPolicy::Ignore => false,
    }
}

/// Entry with the highest count; the first such entry wins ties.
pub fn top_entry(map: &CounterMap) -> Option<(&str, u64)> {
    map.iter().fold(None, |best, (key, &count)| match best {
        Some((_, best_count)) if best_count >= count => best,
        _ => Some((key.as_str(), count)),
    })
}
