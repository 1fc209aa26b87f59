use sci_rs::signal::filter::{
    design::{butter_dyn, DigitalFilter, FilterBandType, FilterOutputType, SosFormatFilter},
    sosfiltfilt_dyn,
};

/// Lower edge of the ECG passband (Hz).
pub const LOW_CUTOFF_HZ: f64 = 1.0;
/// Upper edge of the ECG passband (Hz).
pub const HIGH_CUTOFF_HZ: f64 = 15.0;

const FILTER_ORDER: usize = 3;

/// Post-filter amplitude range below this fraction of the input
/// amplitude is residual numeric ripple, not signal.
const RANGE_EPS: f64 = 1e-9;

/// Zero-phase 1-15 Hz Butterworth bandpass followed by min-max scaling
/// into [0, 1].
///
/// The forward-backward pass keeps R-peak positions unshifted. A window
/// with no amplitude range after filtering has no defined scaling and
/// comes back all zero, so downstream beat detection degrades to "no
/// beats" instead of seeing NaN.
pub fn bandpass_normalize(samples: &[f64], fs: f64) -> Vec<f64> {
    if samples.is_empty() || !(fs > 2.0 * HIGH_CUTOFF_HZ) {
        return vec![0.0; samples.len()];
    }
    let filter = butter_dyn(
        FILTER_ORDER,
        vec![LOW_CUTOFF_HZ, HIGH_CUTOFF_HZ],
        Some(FilterBandType::Bandpass),
        Some(false),
        Some(FilterOutputType::Sos),
        Some(fs),
    );
    let DigitalFilter::Sos(SosFormatFilter { sos }) = filter else {
        return vec![0.0; samples.len()];
    };
    let filtered: Vec<f64> = sosfiltfilt_dyn(samples.iter(), &sos);
    // Filtering a constant window leaves ~1e-13 ripple rather than exact
    // zeros; judge the range against the input amplitude, not against 0.
    let input_scale = samples.iter().fold(0.0f64, |m, &x| m.max(x.abs()));
    min_max_scale(&filtered, input_scale * RANGE_EPS)
}

fn min_max_scale(data: &[f64], tol: f64) -> Vec<f64> {
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range <= tol {
        return vec![0.0; data.len()];
    }
    data.iter().map(|&x| (x - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn output_spans_unit_interval() {
        let fs = 250.0;
        let samples: Vec<f64> = (0..2500)
            .map(|i| (2.0 * PI * 8.0 * i as f64 / fs).sin() + 3.0)
            .collect();
        let out = bandpass_normalize(&samples, fs);
        assert_eq!(out.len(), samples.len());
        let min = out.iter().copied().fold(f64::INFINITY, f64::min);
        let max = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(min >= 0.0 && max <= 1.0);
        assert!((min - 0.0).abs() < 1e-12);
        assert!((max - 1.0).abs() < 1e-12);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn constant_window_maps_to_zeros() {
        let out = bandpass_normalize(&vec![5.0; 2500], 250.0);
        assert_eq!(out.len(), 2500);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn small_signal_on_large_offset_still_scales() {
        // The ripple tolerance must not swallow a genuine in-band signal
        // just because it rides on a big baseline.
        let fs = 250.0;
        let samples: Vec<f64> = (0..2500)
            .map(|i| 1000.0 + (2.0 * PI * 8.0 * i as f64 / fs).sin())
            .collect();
        let out = bandpass_normalize(&samples, fs);
        let max = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_window_maps_to_empty() {
        assert!(bandpass_normalize(&[], 250.0).is_empty());
    }

    #[test]
    fn peak_positions_survive_zero_phase_pass() {
        // An in-band sine keeps its extrema where they were.
        let fs = 250.0;
        let freq = 5.0;
        let samples: Vec<f64> = (0..2500)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect();
        let out = bandpass_normalize(&samples, fs);
        // First positive peak of the input is at a quarter period.
        let quarter = (fs / freq / 4.0).round() as usize;
        let neighborhood = &out[quarter.saturating_sub(3)..quarter + 4];
        let local_max = neighborhood.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(local_max > 0.9);
    }
}
