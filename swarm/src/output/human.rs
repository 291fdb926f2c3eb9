use std::path::Path;
use std::sync::Arc;

use indicatif::MultiProgress;

mod format;
mod progress;
mod summary;

use format::format_ms;
use progress::HumanProgress;
use summary::{cohort_line, render};
use swarm_core::runner::{ProgressFn, ProgressUpdate};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new(bars: MultiProgress) -> Self {
        Self {
            progress: Arc::new(HumanProgress::new(bars)),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, config: &swarm_core::RunConfig) {
        println!("target: {}", config.base_url);
        for (cohort, users) in &config.population {
            println!("cohort: {cohort} users={users}");
        }
        println!(
            "concurrency={} coverage={} timeout={} retries={}",
            config.concurrency_limit,
            config.coverage_fraction,
            format_ms(config.request_timeout.as_secs_f64() * 1000.0),
            config.retry_attempts
        );
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();
        Some(Arc::new(move |u: ProgressUpdate| match u {
            ProgressUpdate::CohortStarted {
                cohort,
                users,
                batches,
            } => progress.start(cohort, users, batches),
            ProgressUpdate::BatchCompleted(p) => progress.update(&p),
            ProgressUpdate::CohortFinished(result) => {
                progress.finish_cohort(result.cohort, &cohort_line(&result));
            }
        }))
    }

    fn print_summary(&self, report: &swarm_core::Report, report_path: &Path) -> anyhow::Result<()> {
        self.progress.finish();
        println!();
        print!("{}", render(report, report_path));
        Ok(())
    }
}
