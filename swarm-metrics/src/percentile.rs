/// Index of the `p`-th quantile in a sorted list of `len` values: `floor(len × p)`, clamped to
/// the last element.
///
/// A small epsilon absorbs float representation error (`100 × 0.29` is `28.999…`).
fn quantile_index(len: usize, p: f64) -> usize {
    let raw = ((len as f64) * p.clamp(0.0, 1.0) + 1e-9).floor() as usize;
    raw.min(len.saturating_sub(1))
}

/// Returns the `p`-th quantile (`0.0..=1.0`) of an already sorted slice, or `None` when empty.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[quantile_index(sorted.len(), p)])
}

/// Sorts a copy of `values` and returns its `p`-th quantile.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sort_durations(&mut sorted);
    percentile_sorted(&sorted, p)
}

pub(crate) fn sort_durations(values: &mut [f64]) {
    values.sort_unstable_by(f64::total_cmp);
}

/// Latency summary over a list of durations (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DurationSummary {
    pub count: u64,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub p50: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
}

impl DurationSummary {
    /// Summarizes `values`, sorting them in place once.
    pub fn from_unsorted(values: &mut [f64]) -> Self {
        sort_durations(values);
        Self::from_sorted(values)
    }

    pub fn from_sorted(sorted: &[f64]) -> Self {
        let count = sorted.len() as u64;
        let avg = (count > 0).then(|| sorted.iter().sum::<f64>() / (count as f64));

        Self {
            count,
            avg,
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            p50: percentile_sorted(sorted, 0.50),
            p95: percentile_sorted(sorted, 0.95),
            p99: percentile_sorted(sorted, 0.99),
        }
    }
}
