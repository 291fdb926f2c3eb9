use std::collections::BTreeMap;
use std::time::Duration;

use crate::bottleneck::BottleneckThresholds;
use crate::error::{Error, Result};
use crate::readiness::ReadinessLimits;

/// Cohort label. Ordering follows declaration, so cohorts run beginner first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_COHORT_SIZE: u64 = 500;

/// The HTTP surface a virtual user walks. Item templates use `{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub landing_route: String,
    pub auth_route: String,
    pub catalog_endpoint: String,
    pub detail_endpoint: String,
    pub sub_resources: Vec<String>,
    pub secondary_routes: Vec<String>,
    pub auxiliary_endpoints: Vec<String>,
    pub resample_size: usize,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            landing_route: "/".to_string(),
            auth_route: "/login".to_string(),
            catalog_endpoint: "/api/lessons".to_string(),
            detail_endpoint: "/api/lessons/{id}".to_string(),
            sub_resources: vec![
                "/api/lessons/{id}/vocabulary".to_string(),
                "/api/lessons/{id}/quiz".to_string(),
            ],
            secondary_routes: [
                "/dashboard",
                "/lessons",
                "/vocabulary",
                "/practice",
                "/progress",
                "/profile",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            auxiliary_endpoints: ["/api/vocabulary", "/api/progress", "/api/achievements"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            resample_size: 3,
        }
    }
}

/// Expands an item template (`/api/lessons/{id}/quiz`) for one id.
pub fn item_path(template: &str, id: u64) -> String {
    template.replace("{id}", &id.to_string())
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub population: BTreeMap<SkillLevel, u64>,
    pub coverage_fraction: f64,
    pub concurrency_limit: usize,
    pub request_timeout: Duration,
    /// Total tries per request, including the first.
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub inter_action_delay: Duration,
    pub inter_batch_delay: Duration,
    pub seed: Option<u64>,
    pub user_sample_limit: usize,
    pub surface: Surface,
    pub thresholds: BottleneckThresholds,
    pub readiness: ReadinessLimits,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            population: [
                (SkillLevel::Beginner, DEFAULT_COHORT_SIZE),
                (SkillLevel::Intermediate, DEFAULT_COHORT_SIZE),
                (SkillLevel::Advanced, DEFAULT_COHORT_SIZE),
            ]
            .into_iter()
            .collect(),
            coverage_fraction: 0.90,
            concurrency_limit: 50,
            request_timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            inter_action_delay: Duration::from_millis(100),
            inter_batch_delay: Duration::from_millis(1000),
            seed: None,
            user_sample_limit: 50,
            surface: Surface::default(),
            thresholds: BottleneckThresholds::default(),
            readiness: ReadinessLimits::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|_| Error::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::InvalidBaseUrl(self.base_url.clone()));
        }

        if self.population.is_empty() {
            return Err(Error::EmptyPopulation);
        }
        if let Some((cohort, _)) = self.population.iter().find(|(_, n)| **n == 0) {
            return Err(Error::EmptyCohort(*cohort));
        }

        if !(self.coverage_fraction > 0.0 && self.coverage_fraction <= 1.0) {
            return Err(Error::InvalidCoverage(self.coverage_fraction));
        }
        if self.concurrency_limit == 0 {
            return Err(Error::InvalidConcurrency);
        }
        if self.retry_attempts == 0 {
            return Err(Error::InvalidRetryAttempts);
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }

        Ok(())
    }

    pub fn total_users(&self) -> u64 {
        self.population.values().sum()
    }

    /// Absolute URL for a surface path.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}
