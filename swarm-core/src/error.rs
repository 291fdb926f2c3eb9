use crate::config::SkillLevel;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`base_url` must be an absolute http:// or https:// URL (got `{0}`)")]
    InvalidBaseUrl(String),

    #[error("`population` must name at least one cohort")]
    EmptyPopulation,

    #[error("cohort `{0}` must have a positive user count")]
    EmptyCohort(SkillLevel),

    #[error("`coverage_fraction` must be in (0, 1] (got {0})")]
    InvalidCoverage(f64),

    #[error("`concurrency_limit` must be a positive integer")]
    InvalidConcurrency,

    #[error("`retry_attempts` must be a positive integer")]
    InvalidRetryAttempts,

    #[error("`request_timeout` must be a positive duration")]
    InvalidTimeout,

    #[error("target `{url}` is unreachable: {reason}")]
    TargetUnreachable { url: String, reason: String },
}
