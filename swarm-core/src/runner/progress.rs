use std::time::Duration;

use crate::config::SkillLevel;
use crate::runner::population::CohortResult;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub cohort: SkillLevel,
    /// 1-based batch index.
    pub batch: usize,
    pub batches: usize,
    pub users_done: u64,
    pub users_total: u64,
    pub users_failed: u64,
    /// Time since the cohort started.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    CohortStarted {
        cohort: SkillLevel,
        users: u64,
        batches: usize,
    },
    BatchCompleted(BatchProgress),
    CohortFinished(CohortResult),
}

pub type ProgressFn = std::sync::Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
