use serde::Serialize;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use swarm_core::SkillLevel;
use swarm_core::runner::{BatchProgress, CohortResult, ProgressFn, ProgressUpdate};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _config: &swarm_core::RunConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u: ProgressUpdate| match u {
            ProgressUpdate::CohortStarted {
                cohort,
                users,
                batches,
            } => emit_json_line(&JsonCohortStartedLine {
                kind: "cohort_started",
                cohort,
                users,
                batches,
            }),
            ProgressUpdate::BatchCompleted(p) => emit_json_line(&build_progress_line(&p)),
            ProgressUpdate::CohortFinished(result) => {
                emit_json_line(&build_cohort_line(&result));
            }
        }))
    }

    fn print_summary(&self, report: &swarm_core::Report, report_path: &Path) -> anyhow::Result<()> {
        emit_json_line(&JsonSummaryLine {
            kind: "summary",
            report_path: report_path.display().to_string(),
            ready: report.readiness.ready,
            report,
        });
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonCohortStartedLine {
    pub kind: &'static str,
    pub cohort: SkillLevel,
    pub users: u64,
    pub batches: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub cohort: SkillLevel,
    pub batch: usize,
    pub batches: usize,
    pub users_done: u64,
    pub users_total: u64,
    pub users_failed: u64,
    pub elapsed_ms: u64,
}

fn build_progress_line(p: &BatchProgress) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        cohort: p.cohort,
        batch: p.batch,
        batches: p.batches,
        users_done: p.users_done,
        users_total: p.users_total,
        users_failed: p.users_failed,
        elapsed_ms: u64::try_from(p.elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonCohortLine {
    pub kind: &'static str,
    pub cohort: SkillLevel,
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub degraded: bool,
    pub avg_duration_ms: f64,
    pub resources_visited: u64,
    pub routes_visited: u64,
}

fn build_cohort_line(c: &CohortResult) -> JsonCohortLine {
    JsonCohortLine {
        kind: "cohort",
        cohort: c.cohort,
        total: c.total,
        successful: c.successful,
        failed: c.failed,
        success_rate: c.success_rate(),
        degraded: c.is_degraded(),
        avg_duration_ms: c.avg_duration_ms,
        resources_visited: c.total_resources_visited,
        routes_visited: c.total_routes_visited,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine<'a> {
    pub kind: &'static str,
    pub report_path: String,
    pub ready: bool,
    pub report: &'a swarm_core::Report,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
