use crate::cli::OutputFormat;
use std::path::Path;

use indicatif::MultiProgress;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, config: &swarm_core::RunConfig);
    fn progress(&self) -> Option<swarm_core::runner::ProgressFn>;
    fn print_summary(&self, report: &swarm_core::Report, report_path: &Path)
    -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat, bars: MultiProgress) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new(bars)),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
