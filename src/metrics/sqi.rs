//! Template-correlation signal quality for one ECG window.
//!
//! A beat set is first screened for physiological plausibility, then the
//! raw window is scored by correlating every beat-centered segment
//! against their average shape. Quality holds only when both stages pass.

use crate::metrics::median;
use crate::signal::{BeatList, RrIntervals};
use serde::{Deserialize, Serialize};

const MIN_HR_BPM: f64 = 40.0;
const MAX_HR_BPM: f64 = 180.0;
const MAX_RR_S: f64 = 3.0;
const MAX_RR_RATIO: f64 = 2.2;

/// Outcome of the per-window quality check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SqiReport {
    /// Physiological plausibility of the detected beat set.
    pub feasible: bool,
    /// Mean per-beat Pearson correlation against the template, when the
    /// window produced any usable beat segments.
    pub mean_correlation: Option<f64>,
    /// Accept/reject flag gating heart rate and NN intervals downstream.
    pub quality: bool,
}

impl SqiReport {
    fn infeasible() -> Self {
        Self {
            feasible: false,
            mean_correlation: None,
            quality: false,
        }
    }
}

/// Coarse plausibility screen over the detected beats.
///
/// All checks must hold: at least two beats (checked first, the RR
/// extrema are undefined otherwise), implied heart rate within
/// [40, 180] bpm inclusive, no RR interval above 3 s, and a max/min RR
/// ratio strictly below 2.2.
pub fn assess_feasibility(beats: &BeatList, fs: f64, window_duration_s: f64) -> bool {
    if beats.len() < 2 {
        return false;
    }

    let implied_hr = beats.len() as f64 * 60.0 / window_duration_s;
    let rr = RrIntervals::from_beats(beats, fs);
    let max_rr = rr.seconds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_rr = rr.seconds.iter().copied().fold(f64::INFINITY, f64::min);

    let hr_ok = (MIN_HR_BPM..=MAX_HR_BPM).contains(&implied_hr);
    let max_rr_ok = max_rr <= MAX_RR_S;
    let ratio_ok = min_rr > 0.0 && max_rr / min_rr < MAX_RR_RATIO;

    hr_ok && max_rr_ok && ratio_ok
}

/// Half-width in samples of the beat-aligned segment, `floor(median RR
/// in samples / 2)`. Needs at least two beats.
pub fn beat_tolerance(beats: &BeatList) -> Option<usize> {
    if beats.len() < 2 {
        return None;
    }
    let rr_samples: Vec<f64> = beats
        .indices
        .windows(2)
        .map(|w| w[1] as f64 - w[0] as f64)
        .collect();
    Some((median(&rr_samples) / 2.0).floor() as usize)
}

/// Average beat-centered segment of the **raw** window.
///
/// Every beat except the last contributes the slice
/// `[beat - tol, beat + tol]`; segments whose bounds leave
/// `[0, beats.last()]` are skipped. `None` when no beat qualifies.
pub fn build_template(raw: &[f64], beats: &BeatList) -> Option<Vec<f64>> {
    let tol = beat_tolerance(beats)?;
    let segments = beat_segments(raw, beats, tol);
    if segments.is_empty() {
        return None;
    }
    let mut sum = vec![0.0; 1 + 2 * tol];
    for segment in &segments {
        for (acc, &s) in sum.iter_mut().zip(segment.iter()) {
            *acc += s;
        }
    }
    let count = segments.len() as f64;
    for acc in sum.iter_mut() {
        *acc /= count;
    }
    Some(sum)
}

/// Mean Pearson correlation between each qualifying beat segment and the
/// template, drawn with the same tolerance and skip rule as
/// [`build_template`]. `None` when no beat qualifies.
pub fn mean_template_correlation(raw: &[f64], beats: &BeatList, template: &[f64]) -> Option<f64> {
    let tol = beat_tolerance(beats)?;
    let segments = beat_segments(raw, beats, tol);
    if segments.is_empty() {
        return None;
    }
    let sum: f64 = segments.iter().map(|seg| pearson(seg, template)).sum();
    Some(sum / segments.len() as f64)
}

/// Run feasibility, template, and correlation for one window.
///
/// Zero usable template beats counts as a failed quality check rather
/// than an error; the report is always defined.
pub fn evaluate_sqi(
    raw: &[f64],
    beats: &BeatList,
    fs: f64,
    window_duration_s: f64,
    threshold: f64,
) -> SqiReport {
    if !assess_feasibility(beats, fs, window_duration_s) {
        return SqiReport::infeasible();
    }
    let cc = build_template(raw, beats)
        .and_then(|template| mean_template_correlation(raw, beats, &template));
    SqiReport {
        feasible: true,
        mean_correlation: cc,
        quality: cc.is_some_and(|cc| cc >= threshold),
    }
}

fn beat_segments<'a>(raw: &'a [f64], beats: &BeatList, tol: usize) -> Vec<&'a [f64]> {
    let Some(&last) = beats.indices.last() else {
        return Vec::new();
    };
    let head = &beats.indices[..beats.len().saturating_sub(1)];
    head.iter()
        .filter_map(|&beat| {
            let start = beat.checked_sub(tol)?;
            let end = beat + tol;
            if end > last || end >= raw.len() {
                return None;
            }
            Some(&raw[start..=end])
        })
        .collect()
}

/// Pearson correlation coefficient; 0.0 when either side has zero
/// variance, so degenerate segments never poison the mean with NaN.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    let mean_a = a[..n].iter().sum::<f64>() / nf;
    let mean_b = b[..n].iter().sum::<f64>() / nf;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}
