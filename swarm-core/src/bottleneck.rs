use swarm_metrics::{EndpointSnapshot, ResourceSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, strum::Display)]
pub enum BottleneckKind {
    SlowEndpoint,
    HighErrorRate,
    ResourceIssue,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    #[serde(rename = "type")]
    pub kind: BottleneckKind,
    /// Endpoint key, or the content item id.
    pub key: String,
    /// P95 in milliseconds for slow endpoints, error rate (0..=1) otherwise.
    pub metric_value: f64,
    pub severity: Severity,
}

/// All comparisons are strict (`>`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BottleneckThresholds {
    pub slow_warning_ms: f64,
    pub slow_critical_ms: f64,
    pub error_rate_warning: f64,
    pub error_rate_critical: f64,
    /// Endpoints need more than this many calls before their error rate is judged.
    pub min_endpoint_calls: u64,
    /// Content items need more than this many visits before their error rate is judged.
    pub min_resource_visits: u64,
}

impl Default for BottleneckThresholds {
    fn default() -> Self {
        Self {
            slow_warning_ms: 2000.0,
            slow_critical_ms: 5000.0,
            error_rate_warning: 0.05,
            error_rate_critical: 0.10,
            min_endpoint_calls: 10,
            min_resource_visits: 10,
        }
    }
}

impl BottleneckThresholds {
    fn latency_severity(&self, p95_ms: f64) -> Option<Severity> {
        if p95_ms > self.slow_critical_ms {
            Some(Severity::Critical)
        } else if p95_ms > self.slow_warning_ms {
            Some(Severity::Warning)
        } else {
            None
        }
    }

    fn error_rate_severity(&self, rate: f64) -> Option<Severity> {
        if rate > self.error_rate_critical {
            Some(Severity::Critical)
        } else if rate > self.error_rate_warning {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

/// Read-only scan of endpoint and content-item stats.
///
/// Endpoints are reported in the order given, slow-endpoint findings before error-rate ones for
/// the same endpoint; content items follow.
pub fn detect(
    endpoints: &[EndpointSnapshot],
    resources: &[ResourceSnapshot],
    thresholds: &BottleneckThresholds,
) -> Vec<Bottleneck> {
    let mut out = Vec::new();

    for e in endpoints {
        if let Some(p95) = e.summary().p95
            && let Some(severity) = thresholds.latency_severity(p95)
        {
            out.push(Bottleneck {
                kind: BottleneckKind::SlowEndpoint,
                key: e.endpoint.clone(),
                metric_value: p95,
                severity,
            });
        }

        if e.total_calls > thresholds.min_endpoint_calls {
            let rate = e.error_rate();
            if let Some(severity) = thresholds.error_rate_severity(rate) {
                out.push(Bottleneck {
                    kind: BottleneckKind::HighErrorRate,
                    key: e.endpoint.clone(),
                    metric_value: rate,
                    severity,
                });
            }
        }
    }

    for r in resources {
        if r.visits > thresholds.min_resource_visits {
            let rate = r.error_rate();
            if let Some(severity) = thresholds.error_rate_severity(rate) {
                out.push(Bottleneck {
                    kind: BottleneckKind::ResourceIssue,
                    key: r.id.to_string(),
                    metric_value: rate,
                    severity,
                });
            }
        }
    }

    out
}

pub fn count_critical(bottlenecks: &[Bottleneck]) -> usize {
    bottlenecks
        .iter()
        .filter(|b| b.severity == Severity::Critical)
        .count()
}
