use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use swarm_core::{RunConfig, SkillLevel};

/// `swarm.yaml`. Every key is optional; absent keys keep the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub base_url: Option<String>,
    /// Cohort -> user count. Replaces the default population as a whole.
    pub population: Option<BTreeMap<SkillLevel, u64>>,
    pub coverage_fraction: Option<f64>,
    pub concurrency_limit: Option<usize>,
    pub request_timeout: Option<YamlDuration>,
    pub retry_attempts: Option<u32>,
    pub retry_delay: Option<YamlDuration>,
    pub inter_action_delay: Option<YamlDuration>,
    pub inter_batch_delay: Option<YamlDuration>,
    pub seed: Option<u64>,
    pub user_sample_limit: Option<usize>,
    #[serde(default)]
    pub surface: SurfaceYaml,
    #[serde(default)]
    pub thresholds: ThresholdsYaml,
    #[serde(default)]
    pub readiness: ReadinessYaml,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct SurfaceYaml {
    pub landing_route: Option<String>,
    pub auth_route: Option<String>,
    pub catalog_endpoint: Option<String>,
    pub detail_endpoint: Option<String>,
    pub sub_resources: Option<Vec<String>>,
    pub secondary_routes: Option<Vec<String>>,
    pub auxiliary_endpoints: Option<Vec<String>>,
    pub resample_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ThresholdsYaml {
    pub slow_warning_ms: Option<f64>,
    pub slow_critical_ms: Option<f64>,
    pub error_rate_warning: Option<f64>,
    pub error_rate_critical: Option<f64>,
    pub min_endpoint_calls: Option<u64>,
    pub min_resource_visits: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ReadinessYaml {
    pub min_user_success_rate: Option<f64>,
    pub min_request_success_rate: Option<f64>,
    pub max_p95_ms: Option<f64>,
    pub max_critical_bottlenecks: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    pub(crate) fn into_inner(self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 250ms, 10s) or integer seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(|secs| YamlDuration(Duration::from_secs(secs)))
                    .map_err(|_| E::custom("duration must not be negative"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                crate::cli::parse_duration(v)
                    .map(YamlDuration)
                    .map_err(E::custom)
            }
        }

        deserializer.deserialize_any(V)
    }
}

impl ConfigFile {
    pub(crate) async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub(crate) fn parse(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overwrites every value this file sets.
    pub(crate) fn apply(self, cfg: &mut RunConfig) {
        set(&mut cfg.base_url, self.base_url);
        set(&mut cfg.population, self.population);
        set(&mut cfg.coverage_fraction, self.coverage_fraction);
        set(&mut cfg.concurrency_limit, self.concurrency_limit);
        set(&mut cfg.request_timeout, self.request_timeout.map(YamlDuration::into_inner));
        set(&mut cfg.retry_attempts, self.retry_attempts);
        set(&mut cfg.retry_delay, self.retry_delay.map(YamlDuration::into_inner));
        set(
            &mut cfg.inter_action_delay,
            self.inter_action_delay.map(YamlDuration::into_inner),
        );
        set(
            &mut cfg.inter_batch_delay,
            self.inter_batch_delay.map(YamlDuration::into_inner),
        );
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        set(&mut cfg.user_sample_limit, self.user_sample_limit);

        let surface = &mut cfg.surface;
        let s = self.surface;
        set(&mut surface.landing_route, s.landing_route);
        set(&mut surface.auth_route, s.auth_route);
        set(&mut surface.catalog_endpoint, s.catalog_endpoint);
        set(&mut surface.detail_endpoint, s.detail_endpoint);
        set(&mut surface.sub_resources, s.sub_resources);
        set(&mut surface.secondary_routes, s.secondary_routes);
        set(&mut surface.auxiliary_endpoints, s.auxiliary_endpoints);
        set(&mut surface.resample_size, s.resample_size);

        let thresholds = &mut cfg.thresholds;
        let t = self.thresholds;
        set(&mut thresholds.slow_warning_ms, t.slow_warning_ms);
        set(&mut thresholds.slow_critical_ms, t.slow_critical_ms);
        set(&mut thresholds.error_rate_warning, t.error_rate_warning);
        set(&mut thresholds.error_rate_critical, t.error_rate_critical);
        set(&mut thresholds.min_endpoint_calls, t.min_endpoint_calls);
        set(&mut thresholds.min_resource_visits, t.min_resource_visits);

        let readiness = &mut cfg.readiness;
        let r = self.readiness;
        set(&mut readiness.min_user_success_rate, r.min_user_success_rate);
        set(&mut readiness.min_request_success_rate, r.min_request_success_rate);
        set(&mut readiness.max_p95_ms, r.max_p95_ms);
        set(&mut readiness.max_critical_bottlenecks, r.max_critical_bottlenecks);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ConfigFile {
        match ConfigFile::parse(raw) {
            Ok(v) => v,
            Err(err) => panic!("parse failed: {err:#}"),
        }
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let mut cfg = RunConfig::default();
        parse("").apply(&mut cfg);
        assert_eq!(cfg.concurrency_limit, 50);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.population.len(), 3);
    }

    #[test]
    fn values_override_defaults() {
        let raw = r#"
baseUrl: http://127.0.0.1:9000
population:
  beginner: 20
  advanced: 5
coverageFraction: 0.5
concurrencyLimit: 10
requestTimeout: 5s
retryAttempts: 2
retryDelay: 250ms
interActionDelay: 0
interBatchDelay: 2
seed: 7
surface:
  catalogEndpoint: /api/courses
  detailEndpoint: /api/courses/{id}
  subResources: [/api/courses/{id}/notes]
thresholds:
  slowWarningMs: 1500
readiness:
  maxP95Ms: 2500
  maxCriticalBottlenecks: 1
"#;
        let mut cfg = RunConfig::default();
        parse(raw).apply(&mut cfg);

        assert_eq!(cfg.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.population.len(), 2);
        assert_eq!(cfg.population.get(&SkillLevel::Beginner), Some(&20));
        assert_eq!(cfg.population.get(&SkillLevel::Intermediate), None);
        assert_eq!(cfg.coverage_fraction, 0.5);
        assert_eq!(cfg.concurrency_limit, 10);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.retry_attempts, 2);
        assert_eq!(cfg.retry_delay, Duration::from_millis(250));
        assert_eq!(cfg.inter_action_delay, Duration::ZERO);
        assert_eq!(cfg.inter_batch_delay, Duration::from_secs(2));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.surface.catalog_endpoint, "/api/courses");
        assert_eq!(cfg.surface.sub_resources, vec!["/api/courses/{id}/notes"]);
        // Untouched surface keys keep their defaults.
        assert_eq!(cfg.surface.auth_route, "/login");
        assert_eq!(cfg.thresholds.slow_warning_ms, 1500.0);
        assert_eq!(cfg.thresholds.slow_critical_ms, 5000.0);
        assert_eq!(cfg.readiness.max_p95_ms, 2500.0);
        assert_eq!(cfg.readiness.max_critical_bottlenecks, 1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("concurency: 3").is_err());
        assert!(ConfigFile::parse("thresholds:\n  slowMs: 3").is_err());
    }

    #[test]
    fn bad_durations_are_rejected() {
        assert!(ConfigFile::parse("requestTimeout: soon").is_err());
        assert!(ConfigFile::parse("retryDelay: -1").is_err());
    }

    #[test]
    fn unknown_cohort_is_rejected() {
        assert!(ConfigFile::parse("population:\n  expert: 3").is_err());
    }
}
