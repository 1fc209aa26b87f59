//! Helpers over the per-window heart-rate stream the evaluator emits.
//!
//! One value per 10 s window, 0 standing for "no trusted rate". These
//! run after the per-patient array is reassembled in window order.

use crate::metrics::median;

/// Longest run of missing 10 s values bridged by interpolation (10 min).
pub const DEFAULT_MAX_GAP_WINDOWS: usize = 60;

/// Collapse 10 s heart rates into 30 s values: the median of the
/// non-zero entries of each group of three, or 0 when all are missing.
pub fn hr_30s_medians(hr_bpm: &[f64]) -> Vec<f64> {
    hr_bpm
        .chunks(3)
        .map(|group| {
            let present: Vec<f64> = group.iter().copied().filter(|&v| v != 0.0).collect();
            if present.is_empty() {
                0.0
            } else {
                median(&present)
            }
        })
        .collect()
}

/// Bridge runs of zero heart rate with linear interpolation between the
/// surrounding trusted values. Runs longer than `max_gap` windows stay
/// zero, as do runs touching either end of the series.
pub fn impute_hr_gaps(hr_bpm: &[f64], max_gap: usize) -> Vec<f64> {
    let mut out = hr_bpm.to_vec();
    let mut i = 0;
    while i < out.len() {
        if out[i] != 0.0 {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while end < out.len() && out[end] == 0.0 {
            end += 1;
        }
        let run = end - start;
        if run <= max_gap && start > 0 && end < out.len() {
            let left = out[start - 1];
            let right = out[end];
            for k in 0..run {
                let frac = (k + 1) as f64 / (run + 1) as f64;
                out[start + k] = left + frac * (right - left);
            }
        }
        i = end;
    }
    out
}

/// SDANN over a heart-rate series: the standard deviation, in
/// milliseconds, of per-segment mean NN intervals (60/hr). Zero rates
/// are skipped; fewer than two populated segments yield 0.
pub fn sdann_ms(hr_bpm: &[f64], segment_len: usize) -> f64 {
    if segment_len == 0 {
        return 0.0;
    }
    let mut segment_means = Vec::new();
    for chunk in hr_bpm.chunks(segment_len) {
        let ann: Vec<f64> = chunk
            .iter()
            .filter(|&&v| v > 0.0)
            .map(|&v| 60.0 / v)
            .collect();
        if ann.is_empty() {
            continue;
        }
        segment_means.push(ann.iter().sum::<f64>() / ann.len() as f64);
    }
    if segment_means.len() < 2 {
        return 0.0;
    }
    let mean = segment_means.iter().sum::<f64>() / segment_means.len() as f64;
    let var = segment_means
        .iter()
        .map(|m| (m - mean).powi(2))
        .sum::<f64>()
        / segment_means.len() as f64;
    var.sqrt() * 1000.0
}
