use std::sync::Arc;

use crate::config::SkillLevel;
use crate::journey::{JourneyContext, run_journey};
use crate::user::{JourneyResult, UserSummary};

use super::progress::{ProgressFn, ProgressUpdate};
use super::scheduler::BatchScheduler;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortResult {
    pub cohort: SkillLevel,
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_duration_ms: f64,
    pub total_resources_visited: u64,
    pub total_routes_visited: u64,
}

impl CohortResult {
    pub fn from_results(cohort: SkillLevel, results: &[JourneyResult]) -> Self {
        let total = results.len() as u64;
        let successful = results.iter().filter(|r| r.succeeded()).count() as u64;
        // Aborted journeys have no duration and stay out of the average.
        let (sum_ms, timed) = results
            .iter()
            .filter(|r| r.error.is_none())
            .fold((0.0, 0u64), |(sum, n), r| (sum + r.user.duration_ms, n + 1));
        let avg_duration_ms = if timed == 0 {
            0.0
        } else {
            sum_ms / timed as f64
        };

        Self {
            cohort,
            total,
            successful,
            failed: total - successful,
            avg_duration_ms,
            total_resources_visited: results
                .iter()
                .map(|r| r.user.resources_visited as u64)
                .sum(),
            total_routes_visited: results.iter().map(|r| r.user.routes_visited as u64).sum(),
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    /// Some users failed. Informational only; it never fails the run.
    pub fn is_degraded(&self) -> bool {
        self.failed > 0
    }
}

/// A finished cohort: its aggregate plus every user's summary, in user-index order.
#[derive(Debug, Clone)]
pub struct CohortRun {
    pub result: CohortResult,
    pub users: Vec<UserSummary>,
}

/// Runs every user of one cohort through the batch scheduler and folds the outcomes.
pub async fn run_cohort(
    ctx: &Arc<JourneyContext>,
    cohort: SkillLevel,
    users: u64,
    progress: Option<&ProgressFn>,
) -> CohortRun {
    let scheduler = BatchScheduler::new(ctx.config.concurrency_limit, ctx.config.inter_batch_delay);
    tracing::info!(
        %cohort,
        users,
        concurrency = scheduler.concurrency_limit,
        "cohort started"
    );

    let results = scheduler
        .run(
            cohort,
            users,
            |index| run_journey(ctx.clone(), cohort, index),
            progress,
        )
        .await;

    let result = CohortResult::from_results(cohort, &results);
    tracing::info!(
        %cohort,
        total = result.total,
        successful = result.successful,
        failed = result.failed,
        avg_duration_ms = result.avg_duration_ms,
        degraded = result.is_degraded(),
        "cohort finished"
    );
    if let Some(progress) = progress {
        progress(ProgressUpdate::CohortFinished(result.clone()));
    }

    CohortRun {
        result,
        users: results.into_iter().map(|r| r.user).collect(),
    }
}
