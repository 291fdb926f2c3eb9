use std::fmt::Write as _;
use std::path::Path;

use swarm_core::Report;
use swarm_core::runner::CohortResult;

use super::format::*;

pub(crate) fn cohort_line(c: &CohortResult) -> String {
    let mut line = format!(
        "cohort {}: {}/{} users succeeded ({}) avg={} items={} routes={}",
        c.cohort,
        c.successful,
        c.total,
        format_percent(c.success_rate()),
        format_ms(c.avg_duration_ms),
        c.total_resources_visited,
        c.total_routes_visited,
    );
    if c.is_degraded() {
        line.push_str(" [degraded]");
    }
    line
}

pub(crate) fn render(report: &Report, report_path: &Path) -> String {
    let mut out = String::new();

    out.push_str("summary\n");
    writeln!(
        out,
        "  target: {} ({} users, run {})",
        report.config.base_url,
        report.users.total,
        format_ms(report.run_duration_ms)
    )
    .ok();
    writeln!(
        out,
        "  users: {} succeeded, {} failed ({})",
        report.users.successful,
        report.users.failed,
        format_percent(report.users.success_rate)
    )
    .ok();
    writeln!(
        out,
        "  requests: {} total, {} failed ({}) rps={}",
        report.requests.total,
        report.requests.failed,
        format_percent(report.requests.success_rate),
        format_rate(report.requests_per_second)
    )
    .ok();

    let l = &report.latency;
    if l.count > 0 {
        writeln!(
            out,
            "  latency = p50={} p95={} p99={} avg={} min={} max={} (n={})",
            format_ms_opt(l.p50),
            format_ms_opt(l.p95),
            format_ms_opt(l.p99),
            format_ms_opt(l.avg),
            format_ms_opt(l.min),
            format_ms_opt(l.max),
            l.count
        )
        .ok();
    } else {
        out.push_str("  latency: n/a\n");
    }

    if !report.cohorts.is_empty() {
        out.push_str("\ncohorts\n");
        for c in &report.cohorts {
            writeln!(out, "  {}", cohort_line(c)).ok();
        }
    }

    if !report.endpoints.is_empty() {
        out.push_str("\nendpoints\n");
        for e in &report.endpoints {
            writeln!(
                out,
                "  {:<32} calls={} failed={} errors={} p50={} p95={} p99={} avg={}",
                e.endpoint,
                e.total_calls,
                e.fail_count,
                format_percent(e.error_rate),
                format_ms_opt(e.latency.p50),
                format_ms_opt(e.latency.p95),
                format_ms_opt(e.latency.p99),
                format_ms_opt(e.latency.avg)
            )
            .ok();
        }
    }

    if !report.slowest_endpoints.is_empty() {
        out.push_str("\nslowest endpoints\n");
        for e in &report.slowest_endpoints {
            writeln!(
                out,
                "  {:<32} p95={:<8} avg={:<8} calls={} errors={}",
                e.endpoint,
                format_ms_opt(e.latency.p95),
                format_ms_opt(e.latency.avg),
                e.total_calls,
                format_percent(e.error_rate)
            )
            .ok();
        }
    }

    if !report.most_visited.is_empty() {
        out.push_str("\nmost visited items\n");
        for r in &report.most_visited {
            writeln!(out, "  #{:<8} visits={} failed={}", r.id, r.visits, r.failures).ok();
        }
    }

    if !report.user_sample.is_empty() {
        out.push_str("\nuser sample\n");
        for u in &report.user_sample {
            writeln!(
                out,
                "  {:<20} {} items={} routes={} actions={} failed_actions={} took={}{}",
                u.id,
                if u.succeeded { "ok    " } else { "FAILED" },
                u.resources_visited,
                u.routes_visited,
                u.actions,
                u.failed_actions,
                format_ms(u.duration_ms),
                u.failure
                    .as_deref()
                    .map(|f| format!(" ({f})"))
                    .unwrap_or_default()
            )
            .ok();
        }
    }

    out.push('\n');
    if report.bottlenecks.is_empty() {
        out.push_str("bottlenecks: none\n");
    } else {
        out.push_str("bottlenecks\n");
        for b in &report.bottlenecks {
            writeln!(
                out,
                "  [{}] {} {}: {}",
                b.severity,
                b.kind,
                b.key,
                bottleneck_value(b)
            )
            .ok();
        }
    }

    out.push_str("\nlaunch readiness\n");
    for c in &report.readiness.criteria {
        let mark = if c.passed { "pass" } else { "FAIL" };
        writeln!(out, "  {mark}  {} (observed {})", c.name, c.observed_value).ok();
    }
    writeln!(
        out,
        "verdict: {}",
        if report.readiness.ready {
            "READY"
        } else {
            "NOT READY"
        }
    )
    .ok();
    writeln!(out, "report: {}", report_path.display()).ok();

    out
}

fn bottleneck_value(b: &swarm_core::Bottleneck) -> String {
    match b.kind {
        swarm_core::BottleneckKind::SlowEndpoint => format!("p95 {}", format_ms(b.metric_value)),
        swarm_core::BottleneckKind::HighErrorRate | swarm_core::BottleneckKind::ResourceIssue => {
            format!("error rate {}", format_percent(b.metric_value))
        }
    }
}
