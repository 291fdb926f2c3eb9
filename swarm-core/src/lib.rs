#![forbid(unsafe_code)]

mod bottleneck;
mod config;
mod error;
mod executor;
mod journey;
mod outputs;
mod preflight;
mod readiness;
mod report;
mod retry;
mod sampling;
mod user;

pub mod runner;

pub use bottleneck::{
    Bottleneck, BottleneckKind, BottleneckThresholds, Severity, count_critical, detect,
};
pub use config::{DEFAULT_BASE_URL, DEFAULT_COHORT_SIZE, RunConfig, SkillLevel, Surface, item_path};
pub use error::{Error, Result};
pub use executor::{RequestOutcome, TimedExecutor};
pub use journey::{JourneyContext, parse_catalog, run_journey};
pub use outputs::write_report;
pub use preflight::preflight;
pub use readiness::{Criterion, LaunchReadiness, ReadinessInputs, ReadinessLimits, evaluate};
pub use report::{
    ConfigEcho, EndpointReport, LatencySummary, Report, ReportInput, ResourceReport, Totals,
    synthesize,
};
pub use retry::{Retried, RetryPolicy, retry, retry_if};
pub use sampling::{coverage_count, sample_coverage, user_rng};
pub use user::{Action, ActionKind, JourneyResult, UserSummary, VirtualUser};

pub use swarm_http::HttpClient;
pub use swarm_metrics::Collector;
