mod population;
mod progress;
mod run;
mod scheduler;

pub use population::{CohortResult, CohortRun, run_cohort};
pub use progress::{BatchProgress, ProgressFn, ProgressUpdate};
pub use run::run_population;
pub use scheduler::{BatchScheduler, partition};
