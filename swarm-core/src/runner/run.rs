use std::sync::Arc;
use std::time::{Instant, SystemTime};

use swarm_http::HttpClient;
use swarm_metrics::Collector;

use crate::config::RunConfig;
use crate::error::Result;
use crate::journey::JourneyContext;
use crate::preflight::preflight;
use crate::report::{Report, ReportInput, synthesize};

use super::population::run_cohort;
use super::progress::ProgressFn;

/// Validates the config, checks the target is reachable, runs every cohort in order and
/// synthesizes the report.
///
/// Only an invalid config or an unreachable target fail the run; user and request failures end
/// up in the report.
pub async fn run_population(
    config: RunConfig,
    client: Arc<HttpClient>,
    progress: Option<ProgressFn>,
) -> Result<Report> {
    config.validate()?;
    preflight(&client, &config).await?;

    tracing::info!(
        target_url = %config.base_url,
        cohorts = config.population.len(),
        users = config.total_users(),
        concurrency = config.concurrency_limit,
        "starting run"
    );

    let started_at = SystemTime::now();
    let started = Instant::now();

    let config = Arc::new(config);
    let collector = Arc::new(Collector::new());
    let ctx = Arc::new(JourneyContext::new(
        config.clone(),
        client,
        collector.clone(),
    ));

    let mut cohorts = Vec::with_capacity(config.population.len());
    for (&cohort, &users) in &config.population {
        cohorts.push(run_cohort(&ctx, cohort, users, progress.as_ref()).await);
    }

    let report = synthesize(&ReportInput {
        config: &config,
        cohorts: &cohorts,
        collector: &collector,
        started_at,
        elapsed: started.elapsed(),
    });
    tracing::info!(
        users = report.users.total,
        requests = report.requests.total,
        ready = report.readiness.ready,
        "run finished"
    );

    Ok(report)
}
