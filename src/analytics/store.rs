//! Shared analytics store.
//!
//! One mutex guards the whole counter tree; every update is a short
//! read-modify-write so contention stays negligible. The store is handed to
//! handlers and middleware through `Arc`.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use dashmap::DashSet;

use crate::analytics::counters::{AnalyticsCounters, KeyRules};
use crate::analytics::event::{AnalyticsEvent, SecurityEventKind};
use crate::analytics::snapshot::{
    DonationsView, PerformanceView, SecurityView, SummaryView, VisitorsView,
};
use crate::config::{AnalyticsConfig, UnknownKeyPolicy};
use crate::directory::Directory;
use crate::observability::metrics;

/// Suspicious clients remembered when no limit is configured.
const DEFAULT_MAX_FLAGGED: usize = 10_000;

pub struct AnalyticsStore {
    counters: Mutex<AnalyticsCounters>,
    rules: KeyRules,
    /// Client keys already counted as suspicious.
    flagged_clients: DashSet<String>,
    max_flagged: usize,
    started: Instant,
}

impl AnalyticsStore {
    /// An empty store.
    pub fn new(policy: UnknownKeyPolicy) -> Self {
        Self::with_counters(AnalyticsCounters::default(), KeyRules::new(policy))
    }

    pub fn with_counters(counters: AnalyticsCounters, rules: KeyRules) -> Self {
        Self {
            counters: Mutex::new(counters),
            rules,
            flagged_clients: DashSet::new(),
            max_flagged: DEFAULT_MAX_FLAGGED,
            started: Instant::now(),
        }
    }

    /// A store with zeroed counters for every catalog charity and category
    /// plus the configured countries and referrers.
    pub fn seeded(config: &AnalyticsConfig, directory: &Directory) -> Self {
        let mut counters = AnalyticsCounters::default();
        for record in directory.records() {
            counters.donations.charities_clicked.insert(record.id.clone(), 0);
            counters.donations.category_clicks.insert(record.category.clone(), 0);
        }
        for country in &config.countries {
            counters.visitors.countries.insert(country.clone(), 0);
        }
        for referrer in &config.referrers {
            counters.visitors.referrers.insert(referrer.clone(), 0);
        }
        let mut store = Self::with_counters(counters, KeyRules::from(config));
        store.max_flagged = config.max_flagged_clients;
        store
    }

    fn lock(&self) -> MutexGuard<'_, AnalyticsCounters> {
        // Counters stay consistent even if a holder panicked.
        self.counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply an event dated today (UTC). Returns whether anything was counted.
    pub fn record(&self, event: &AnalyticsEvent) -> bool {
        self.record_on(event, today())
    }

    pub fn record_on(&self, event: &AnalyticsEvent, day: NaiveDate) -> bool {
        let counted = self.lock().apply(event, day, self.rules);
        metrics::record_analytics_event(event.name(), counted);
        counted
    }

    /// Count a security event observed by the request layer.
    pub fn record_security(&self, kind: SecurityEventKind) {
        self.lock().record_security(kind);
    }

    /// Count `client` as suspicious the first time it is seen.
    ///
    /// Once the flag set is full, new clients are no longer counted.
    pub fn flag_client(&self, client: &str) {
        if self.flagged_clients.contains(client) {
            return;
        }
        if self.flagged_clients.len() >= self.max_flagged {
            tracing::warn!(
                max_flagged = self.max_flagged,
                "Suspicious client set full, not flagging"
            );
            return;
        }
        if self.flagged_clients.insert(client.to_string()) {
            self.lock().security.suspicious_ips += 1;
        }
    }

    pub fn record_request(&self, latency: Duration, server_error: bool) {
        self.lock().record_request(latency, server_error);
    }

    /// Copy of the full counter tree.
    pub fn counters(&self) -> AnalyticsCounters {
        self.lock().clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn donations(&self) -> DonationsView {
        DonationsView::from_counters(&self.lock(), today())
    }

    pub fn visitors(&self) -> VisitorsView {
        VisitorsView::from_counters(&self.lock(), today())
    }

    pub fn performance(&self) -> PerformanceView {
        PerformanceView::from_counters(&self.lock(), self.uptime())
    }

    pub fn security(&self) -> SecurityView {
        SecurityView::from_counters(&self.lock())
    }

    pub fn summary(&self) -> SummaryView {
        SummaryView::from_counters(&self.lock(), today())
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
