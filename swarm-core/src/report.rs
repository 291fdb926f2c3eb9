use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use swarm_metrics::{Collector, DurationSummary, EndpointSnapshot, ResourceSnapshot};

use crate::bottleneck::{Bottleneck, count_critical, detect};
use crate::config::{RunConfig, SkillLevel};
use crate::readiness::{LaunchReadiness, ReadinessInputs, evaluate};
use crate::runner::{CohortResult, CohortRun};
use crate::user::UserSummary;

const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: String,
    pub run_duration_ms: f64,
    pub config: ConfigEcho,
    pub cohorts: Vec<CohortResult>,
    pub users: Totals,
    pub requests: Totals,
    pub requests_per_second: f64,
    pub latency: LatencySummary,
    pub endpoints: Vec<EndpointReport>,
    pub bottlenecks: Vec<Bottleneck>,
    pub slowest_endpoints: Vec<EndpointReport>,
    pub most_visited: Vec<ResourceReport>,
    pub readiness: LaunchReadiness,
    pub user_sample: Vec<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEcho {
    pub base_url: String,
    pub population: BTreeMap<SkillLevel, u64>,
    pub coverage_fraction: f64,
    pub concurrency_limit: usize,
    pub request_timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub inter_action_delay_ms: u64,
    pub inter_batch_delay_ms: u64,
    pub seed: Option<u64>,
}

impl From<&RunConfig> for ConfigEcho {
    fn from(cfg: &RunConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            population: cfg.population.clone(),
            coverage_fraction: cfg.coverage_fraction,
            concurrency_limit: cfg.concurrency_limit,
            request_timeout_ms: as_millis(cfg.request_timeout),
            retry_attempts: cfg.retry_attempts,
            retry_delay_ms: as_millis(cfg.retry_delay),
            inter_action_delay_ms: as_millis(cfg.inter_action_delay),
            inter_batch_delay_ms: as_millis(cfg.inter_batch_delay),
            seed: cfg.seed,
        }
    }
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: f64,
}

impl Totals {
    pub fn new(total: u64, successful: u64) -> Self {
        Self {
            total,
            successful,
            failed: total.saturating_sub(successful),
            success_rate: if total == 0 {
                0.0
            } else {
                successful as f64 / total as f64
            },
        }
    }
}

/// Milliseconds; every field is `None` when nothing was recorded.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    pub count: u64,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub p50: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
}

impl From<DurationSummary> for LatencySummary {
    fn from(s: DurationSummary) -> Self {
        Self {
            count: s.count,
            avg: s.avg,
            min: s.min,
            max: s.max,
            p50: s.p50,
            p95: s.p95,
            p99: s.p99,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReport {
    pub endpoint: String,
    pub total_calls: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub error_rate: f64,
    pub latency: LatencySummary,
}

impl From<&EndpointSnapshot> for EndpointReport {
    fn from(e: &EndpointSnapshot) -> Self {
        Self {
            endpoint: e.endpoint.clone(),
            total_calls: e.total_calls,
            success_count: e.success_count,
            fail_count: e.fail_count,
            error_rate: e.error_rate(),
            latency: e.summary().into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReport {
    pub id: u64,
    pub visits: u64,
    pub failures: u64,
    pub error_rate: f64,
}

impl From<&ResourceSnapshot> for ResourceReport {
    fn from(r: &ResourceSnapshot) -> Self {
        Self {
            id: r.id,
            visits: r.visits,
            failures: r.failures,
            error_rate: r.error_rate(),
        }
    }
}

/// Everything the synthesizer reads. Nothing here is mutated.
pub struct ReportInput<'a> {
    pub config: &'a RunConfig,
    pub cohorts: &'a [CohortRun],
    pub collector: &'a Collector,
    pub started_at: SystemTime,
    pub elapsed: Duration,
}

pub fn synthesize(input: &ReportInput<'_>) -> Report {
    let cfg = input.config;

    let endpoint_snaps = input.collector.endpoint_snapshots();
    let resource_snaps = input.collector.resource_snapshots();
    let latency: LatencySummary = input.collector.global_summary().into();

    let (total_requests, successful_requests, _) = input.collector.totals();
    let requests = Totals::new(total_requests, successful_requests);

    let total_users: u64 = input.cohorts.iter().map(|c| c.result.total).sum();
    let successful_users: u64 = input.cohorts.iter().map(|c| c.result.successful).sum();
    let users = Totals::new(total_users, successful_users);

    let bottlenecks = detect(&endpoint_snaps, &resource_snaps, &cfg.thresholds);
    let readiness = evaluate(
        &ReadinessInputs {
            user_success_rate: users.success_rate,
            request_success_rate: requests.success_rate,
            critical_bottlenecks: count_critical(&bottlenecks),
            p95_ms: latency.p95,
        },
        &cfg.readiness,
    );

    let endpoints: Vec<EndpointReport> = endpoint_snaps.iter().map(EndpointReport::from).collect();
    let secs = input.elapsed.as_secs_f64();

    Report {
        generated_at: humantime::format_rfc3339_seconds(input.started_at + input.elapsed)
            .to_string(),
        run_duration_ms: secs * 1000.0,
        config: cfg.into(),
        cohorts: input.cohorts.iter().map(|c| c.result.clone()).collect(),
        users,
        requests,
        requests_per_second: if secs > 0.0 {
            total_requests as f64 / secs
        } else {
            0.0
        },
        latency,
        slowest_endpoints: slowest(&endpoints, TOP_N),
        endpoints,
        bottlenecks,
        most_visited: most_visited(&resource_snaps, TOP_N),
        readiness,
        user_sample: user_sample(input.cohorts, cfg.user_sample_limit),
    }
}

/// Highest P95 first, then highest average. Endpoints without samples sort last.
pub fn slowest(endpoints: &[EndpointReport], n: usize) -> Vec<EndpointReport> {
    let mut sorted: Vec<EndpointReport> = endpoints.to_vec();
    sorted.sort_by(|a, b| {
        desc_opt(a.latency.p95, b.latency.p95)
            .then_with(|| desc_opt(a.latency.avg, b.latency.avg))
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });
    sorted.truncate(n);
    sorted
}

fn desc_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Most visits first; ties go to the lower id.
pub fn most_visited(resources: &[ResourceSnapshot], n: usize) -> Vec<ResourceReport> {
    let mut sorted: Vec<&ResourceSnapshot> = resources.iter().collect();
    sorted.sort_by(|a, b| b.visits.cmp(&a.visits).then(a.id.cmp(&b.id)));
    sorted.into_iter().take(n).map(ResourceReport::from).collect()
}

/// Up to `limit` user summaries, failed users first, each group in run order.
pub fn user_sample(cohorts: &[CohortRun], limit: usize) -> Vec<UserSummary> {
    let all = || cohorts.iter().flat_map(|c| c.users.iter());
    all()
        .filter(|u| !u.succeeded)
        .chain(all().filter(|u| u.succeeded))
        .take(limit)
        .cloned()
        .collect()
}
