pub mod hr_series;
pub mod hrv;
pub mod sqi;

/// Median of a non-empty slice; the mean of the two middle values for
/// even lengths, matching the usual numeric convention. Empty input
/// yields 0.0 so callers stay total.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}
