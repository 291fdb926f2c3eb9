use std::time::Duration;

/// Milliseconds below one second, seconds with two decimals above. `n/a` when absent.
pub(crate) fn format_ms_opt(ms: Option<f64>) -> String {
    match ms {
        Some(v) if v.is_finite() => format_ms(v),
        _ => "n/a".to_string(),
    }
}

pub(crate) fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{ms:.0}ms")
    }
}

pub(crate) fn format_duration(d: Duration) -> String {
    format_ms(d.as_secs_f64() * 1000.0)
}

pub(crate) fn format_percent(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{:.1}%", ratio * 100.0)
    } else {
        "0.0%".to_string()
    }
}

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.1}")
    } else {
        "0".to_string()
    }
}
