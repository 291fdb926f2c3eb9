use std::sync::Arc;

use dashmap::DashMap;

use crate::endpoint::{EndpointSnapshot, EndpointStats};
use crate::key::normalize_endpoint;
use crate::percentile::{DurationSummary, percentile_sorted, sort_durations};
use crate::resource::{ResourceSnapshot, ResourceStats};

/// Run-scoped aggregation store shared by every virtual user.
///
/// Writers only ever append: each endpoint (and each content item) owns its own lock, so
/// concurrent users contend per key rather than on one global structure. The global duration
/// list is never stored; it is concatenated from the per-endpoint lists on demand.
#[derive(Debug, Default)]
pub struct Collector {
    endpoints: DashMap<Arc<str>, Arc<EndpointStats>>,
    resources: DashMap<u64, Arc<ResourceStats>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call against an already normalized endpoint key.
    pub fn record(&self, endpoint_key: &str, duration_ms: f64, succeeded: bool) {
        self.endpoint(endpoint_key).record(duration_ms, succeeded);
    }

    /// Normalizes `target` (a path or URL) and records one call against it.
    pub fn record_target(&self, target: &str, duration_ms: f64, succeeded: bool) {
        let key = normalize_endpoint(target);
        self.record(&key, duration_ms, succeeded);
    }

    pub fn record_resource_visit(&self, id: u64, succeeded: bool) {
        let stats = match self.resources.get(&id) {
            Some(s) => s.value().clone(),
            None => self.resources.entry(id).or_default().value().clone(),
        };
        stats.record_visit(succeeded);
    }

    fn endpoint(&self, key: &str) -> Arc<EndpointStats> {
        // Hot path: the endpoint almost always exists already.
        if let Some(s) = self.endpoints.get(key) {
            return s.value().clone();
        }

        self.endpoints
            .entry(Arc::from(key))
            .or_default()
            .value()
            .clone()
    }

    /// Snapshots of every endpoint, sorted by key.
    pub fn endpoint_snapshots(&self) -> Vec<EndpointSnapshot> {
        let mut out: Vec<EndpointSnapshot> = self
            .endpoint_entries()
            .into_iter()
            .map(|(key, stats)| stats.snapshot(&key))
            .collect();
        out.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        out
    }

    pub fn endpoint_snapshot(&self, key: &str) -> Option<EndpointSnapshot> {
        let stats = self.endpoints.get(key)?.value().clone();
        Some(stats.snapshot(key))
    }

    /// Snapshots of every content item, sorted by id.
    pub fn resource_snapshots(&self) -> Vec<ResourceSnapshot> {
        let entries: Vec<(u64, Arc<ResourceStats>)> = self
            .resources
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();

        let mut out: Vec<ResourceSnapshot> = entries
            .into_iter()
            .map(|(id, stats)| stats.snapshot(id))
            .collect();
        out.sort_by_key(|r| r.id);
        out
    }

    /// All recorded durations across endpoints, sorted ascending.
    pub fn global_durations(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for (_, stats) in self.endpoint_entries() {
            stats.extend_durations(&mut out);
        }
        sort_durations(&mut out);
        out
    }

    /// Quantile `p` over the global duration list.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        percentile_sorted(&self.global_durations(), p)
    }

    /// Quantile `p` over one endpoint's own durations.
    pub fn endpoint_percentile(&self, key: &str, p: f64) -> Option<f64> {
        let mut durations = self.endpoint_snapshot(key)?.durations;
        sort_durations(&mut durations);
        percentile_sorted(&durations, p)
    }

    pub fn global_summary(&self) -> DurationSummary {
        DurationSummary::from_sorted(&self.global_durations())
    }

    /// `(total_calls, success_count, fail_count)` summed over all endpoints.
    pub fn totals(&self) -> (u64, u64, u64) {
        self.endpoint_snapshots()
            .iter()
            .fold((0, 0, 0), |(t, s, f), e| {
                (t + e.total_calls, s + e.success_count, f + e.fail_count)
            })
    }

    // Clone the handles out first so no DashMap shard guard is held while an entry lock is taken.
    fn endpoint_entries(&self) -> Vec<(Arc<str>, Arc<EndpointStats>)> {
        self.endpoints
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}
