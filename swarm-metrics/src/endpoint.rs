use parking_lot::Mutex;

use crate::percentile::DurationSummary;

#[derive(Debug, Default)]
struct Inner {
    total_calls: u64,
    success_count: u64,
    fail_count: u64,
    durations: Vec<f64>,
}

/// Per-endpoint aggregate.
///
/// One lock guards the counters and the duration list together, so
/// `success_count + fail_count == total_calls` holds for every observer.
#[derive(Debug, Default)]
pub struct EndpointStats {
    inner: Mutex<Inner>,
}

impl EndpointStats {
    pub fn record(&self, duration_ms: f64, succeeded: bool) {
        let mut inner = self.inner.lock();
        inner.total_calls += 1;
        if succeeded {
            inner.success_count += 1;
        } else {
            inner.fail_count += 1;
        }
        inner.durations.push(duration_ms.max(0.0));
    }

    pub fn snapshot(&self, endpoint: &str) -> EndpointSnapshot {
        let inner = self.inner.lock();
        EndpointSnapshot {
            endpoint: endpoint.to_string(),
            total_calls: inner.total_calls,
            success_count: inner.success_count,
            fail_count: inner.fail_count,
            durations: inner.durations.clone(),
        }
    }

    /// Appends this endpoint's durations to `out` without copying the counters.
    pub(crate) fn extend_durations(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.inner.lock().durations);
    }
}

/// Point-in-time copy of an [`EndpointStats`] entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSnapshot {
    pub endpoint: String,
    pub total_calls: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub durations: Vec<f64>,
}

impl EndpointSnapshot {
    /// `fail_count / total_calls`, or `0.0` for an endpoint that was never called.
    pub fn error_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.fail_count as f64 / self.total_calls as f64
    }

    pub fn summary(&self) -> DurationSummary {
        let mut durations = self.durations.clone();
        DurationSummary::from_unsorted(&mut durations)
    }
}
