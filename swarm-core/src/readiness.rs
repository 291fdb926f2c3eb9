#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessLimits {
    pub min_user_success_rate: f64,
    pub min_request_success_rate: f64,
    /// Global P95 must stay strictly below this.
    pub max_p95_ms: f64,
    pub max_critical_bottlenecks: usize,
}

impl Default for ReadinessLimits {
    fn default() -> Self {
        Self {
            min_user_success_rate: 0.95,
            min_request_success_rate: 0.95,
            max_p95_ms: 3000.0,
            max_critical_bottlenecks: 0,
        }
    }
}

/// Observed values the verdict is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessInputs {
    pub user_success_rate: f64,
    pub request_success_rate: f64,
    pub critical_bottlenecks: usize,
    /// `None` when no request was recorded.
    pub p95_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub name: String,
    pub passed: bool,
    pub observed_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReadiness {
    pub ready: bool,
    pub criteria: Vec<Criterion>,
}

/// Evaluates the four fixed criteria; the verdict is their conjunction.
pub fn evaluate(inputs: &ReadinessInputs, limits: &ReadinessLimits) -> LaunchReadiness {
    let criteria = vec![
        Criterion {
            name: format!("user success rate >= {}", pct(limits.min_user_success_rate)),
            passed: inputs.user_success_rate >= limits.min_user_success_rate,
            observed_value: pct(inputs.user_success_rate),
        },
        Criterion {
            name: format!(
                "request success rate >= {}",
                pct(limits.min_request_success_rate)
            ),
            passed: inputs.request_success_rate >= limits.min_request_success_rate,
            observed_value: pct(inputs.request_success_rate),
        },
        Criterion {
            name: if limits.max_critical_bottlenecks == 0 {
                "no critical bottlenecks".to_string()
            } else {
                format!(
                    "at most {} critical bottlenecks",
                    limits.max_critical_bottlenecks
                )
            },
            passed: inputs.critical_bottlenecks <= limits.max_critical_bottlenecks,
            observed_value: inputs.critical_bottlenecks.to_string(),
        },
        Criterion {
            name: format!("p95 latency < {}ms", limits.max_p95_ms),
            passed: inputs.p95_ms.is_some_and(|p95| p95 < limits.max_p95_ms),
            observed_value: match inputs.p95_ms {
                Some(p95) => format!("{p95:.0}ms"),
                None => "n/a".to_string(),
            },
        },
    ];

    LaunchReadiness {
        ready: criteria.iter().all(|c| c.passed),
        criteria,
    }
}

fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing() -> ReadinessInputs {
        ReadinessInputs {
            user_success_rate: 0.96,
            request_success_rate: 0.96,
            critical_bottlenecks: 0,
            p95_ms: Some(2500.0),
        }
    }

    #[test]
    fn all_criteria_passing_is_ready() {
        let r = evaluate(&passing(), &ReadinessLimits::default());
        assert!(r.ready);
        assert_eq!(r.criteria.len(), 4);
        assert!(r.criteria.iter().all(|c| c.passed));
        assert_eq!(r.criteria[0].observed_value, "96.0%");
        assert_eq!(r.criteria[3].observed_value, "2500ms");
    }

    #[test]
    fn any_single_failing_criterion_flips_the_verdict() {
        let limits = ReadinessLimits::default();
        let variants = [
            ReadinessInputs {
                user_success_rate: 0.94,
                ..passing()
            },
            ReadinessInputs {
                request_success_rate: 0.90,
                ..passing()
            },
            ReadinessInputs {
                critical_bottlenecks: 1,
                ..passing()
            },
            ReadinessInputs {
                p95_ms: Some(3000.0),
                ..passing()
            },
        ];

        for (i, inputs) in variants.iter().enumerate() {
            let r = evaluate(inputs, &limits);
            assert!(!r.ready, "variant {i} should not be ready");
            assert_eq!(r.criteria.iter().filter(|c| !c.passed).count(), 1);
            assert!(!r.criteria[i].passed);
        }
    }

    #[test]
    fn missing_latency_data_fails_the_p95_criterion() {
        let r = evaluate(
            &ReadinessInputs {
                p95_ms: None,
                ..passing()
            },
            &ReadinessLimits::default(),
        );
        assert!(!r.ready);
        assert_eq!(r.criteria[3].observed_value, "n/a");
    }

    #[test]
    fn exact_success_rate_threshold_passes() {
        let r = evaluate(
            &ReadinessInputs {
                user_success_rate: 0.95,
                request_success_rate: 0.95,
                ..passing()
            },
            &ReadinessLimits::default(),
        );
        assert!(r.ready);
    }
}
