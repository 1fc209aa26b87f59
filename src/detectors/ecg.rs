use crate::signal::BeatList;

/// Tuning for the Pan-Tompkins-style R-peak detector.
///
/// The detector expects the bandpassed, [0,1]-normalized window produced
/// by [`crate::filter::bandpass_normalize`]; only QRS emphasis and the
/// envelope stages live here.
#[derive(Debug, Clone, Copy)]
pub struct RPeakConfig {
    /// High-pass cutoff (Hz) sharpening the QRS complex before the envelope.
    pub emphasis_hz: f64,
    /// Moving window integration length (seconds).
    pub integration_window_s: f64,
    /// Refractory period between detections (seconds).
    pub min_rr_s: f64,
    /// Scale between noise and signal envelopes for the adaptive threshold.
    pub threshold_scale: f64,
    /// How far back to search (seconds) for the precise R-peak after a detection.
    pub search_back_s: f64,
}

impl Default for RPeakConfig {
    fn default() -> Self {
        Self {
            emphasis_hz: 5.0,
            integration_window_s: 0.150,
            min_rr_s: 0.250,
            threshold_scale: 0.6,
            search_back_s: 0.150,
        }
    }
}

/// Detect R-peak sample indices in a filtered, normalized ECG window.
///
/// Returns an empty or short list when no clear peaks exist; flat or
/// noisy input degrades to few/no detections, never an error.
pub fn detect_r_peaks(filtered: &[f64], fs: f64) -> BeatList {
    detect_r_peaks_with_config(filtered, fs, &RPeakConfig::default())
}

pub fn detect_r_peaks_with_config(filtered: &[f64], fs: f64, cfg: &RPeakConfig) -> BeatList {
    if filtered.is_empty() || !(fs > 0.0) {
        return BeatList::from_indices(Vec::new());
    }

    let envelope = qrs_envelope(filtered, fs, cfg);
    let peaks = pick_peaks(filtered, &envelope, fs, cfg);

    if peaks.len() < 2 {
        // Adaptive thresholding underperformed; try the naive picker.
        return BeatList::from_indices(fallback_peak_picker(filtered, fs, cfg));
    }

    BeatList::from_indices(peaks)
}

/// QRS emphasis, squared derivative, moving window integration.
fn qrs_envelope(filtered: &[f64], fs: f64, cfg: &RPeakConfig) -> Vec<f64> {
    let emphasized = single_pole_highpass(filtered, fs, cfg.emphasis_hz);
    let mut energy = vec![0.0; emphasized.len()];
    for i in 1..emphasized.len() {
        let slope = emphasized[i] - emphasized[i - 1];
        energy[i] = slope * slope;
    }
    let win = ((cfg.integration_window_s * fs).round() as usize).max(1);
    moving_average(&energy, win)
}

fn single_pole_highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = rc / (rc + dt);
    let mut out = Vec::with_capacity(data.len());
    let mut prev_y = data[0];
    let mut prev_x = data[0];
    for &x in data {
        let y = alpha * (prev_y + x - prev_x);
        out.push(y);
        prev_y = y;
        prev_x = x;
    }
    out
}

fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    if win <= 1 {
        return data.to_vec();
    }
    let mut out = vec![0.0; data.len()];
    let mut acc = 0.0;
    for (i, &sample) in data.iter().enumerate() {
        acc += sample;
        if i >= win {
            acc -= data[i - win];
        }
        out[i] = acc / win as f64;
    }
    out
}

/// Adaptive two-envelope threshold; each crossing commits the
/// filtered-signal maximum within `search_back_s` on either side, since
/// the envelope rises ahead of the R-peak itself.
fn pick_peaks(filtered: &[f64], envelope: &[f64], fs: f64, cfg: &RPeakConfig) -> Vec<usize> {
    if filtered.is_empty() || envelope.is_empty() {
        return Vec::new();
    }

    let refractory = (cfg.min_rr_s * fs).round().max(1.0) as usize;
    let search = (cfg.search_back_s * fs).round().max(1.0) as usize;

    // Seed the running levels from the first second of envelope.
    let init = envelope.len().min((fs as usize).max(1));
    let avg = envelope[..init].iter().sum::<f64>() / init as f64;
    let mut signal_level = avg;
    let mut noise_level = avg * 0.5;
    let mut threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);

    let mut last_detection = 0usize;
    let mut peaks = Vec::new();

    for (i, &sample) in envelope.iter().enumerate() {
        let refractory_ok = peaks.is_empty() || i - last_detection >= refractory;
        // A zero threshold means the envelope has no dynamic range yet
        // (flat input); nothing real can cross it.
        if threshold > 0.0 && sample >= threshold && refractory_ok {
            let start = i.saturating_sub(search);
            let end = (i + search).min(filtered.len() - 1);
            let mut idx = start;
            let mut max_val = f64::MIN;
            for (j, &v) in filtered.iter().enumerate().take(end + 1).skip(start) {
                if v > max_val {
                    max_val = v;
                    idx = j;
                }
            }
            peaks.push(idx);
            last_detection = i;
            signal_level = 0.125 * sample + 0.875 * signal_level;
        } else {
            noise_level = 0.125 * sample + 0.875 * noise_level;
        }
        threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    }

    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

/// Local-maxima-above-moving-baseline picker, used when the adaptive
/// stage finds fewer than two beats.
fn fallback_peak_picker(filtered: &[f64], fs: f64, cfg: &RPeakConfig) -> Vec<usize> {
    if filtered.len() < 3 {
        return Vec::new();
    }
    let min_gap = (cfg.min_rr_s * fs).max(1.0) as usize;
    let win = ((cfg.integration_window_s * fs) as usize).max(1);
    let baseline = moving_average(filtered, win);

    let mut peaks = Vec::new();
    let mut last_idx = 0usize;
    for i in 1..filtered.len() - 1 {
        let y = filtered[i] - baseline[i];
        if y > 0.0
            && y > (filtered[i - 1] - baseline[i - 1])
            && y > (filtered[i + 1] - baseline[i + 1])
            && (peaks.is_empty() || (i - last_idx) >= min_gap)
        {
            peaks.push(i);
            last_idx = i;
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Gaussian bumps at the given beat times over a low sine baseline,
    /// roughly what the bandpass stage hands over.
    fn synthetic_filtered(fs: f64, beat_times_s: &[f64], duration_s: f64) -> Vec<f64> {
        let samples = (duration_s * fs) as usize;
        let mut data = Vec::with_capacity(samples);
        for i in 0..samples {
            let t = i as f64 / fs;
            let mut v = 0.05 * (2.0 * PI * t).sin() + 0.1;
            for &bt in beat_times_s {
                let width = 0.02;
                v += 0.8 * (-0.5 * ((t - bt) / width).powi(2)).exp();
            }
            data.push(v);
        }
        data
    }

    fn beat_times(start: f64, rr: &[f64]) -> Vec<f64> {
        let mut t = start;
        let mut out = vec![t];
        for &interval in rr {
            t += interval;
            out.push(t);
        }
        out
    }

    #[test]
    fn detects_regular_beats() {
        let fs = 250.0;
        let rr = [0.82, 0.78, 0.8, 0.79, 0.81, 0.77, 0.84, 0.88];
        let times = beat_times(0.5, &rr);
        let sig = synthetic_filtered(fs, &times, times.last().unwrap() + 1.0);
        let beats = detect_r_peaks(&sig, fs);
        assert_eq!(beats.len(), rr.len() + 1);
    }

    #[test]
    fn detections_land_within_one_sample_of_true_peaks() {
        // 1000 ms train with peaks exactly on the sample grid.
        let fs = 250.0;
        let rr = [1.0; 8];
        let times = beat_times(0.5, &rr);
        let sig = synthetic_filtered(fs, &times, times.last().unwrap() + 1.0);
        let beats = detect_r_peaks(&sig, fs);
        assert_eq!(beats.len(), times.len());
        for &bt in &times {
            let truth = (bt * fs).round() as isize;
            let nearest = beats
                .indices
                .iter()
                .map(|&d| (d as isize - truth).abs())
                .min()
                .unwrap();
            assert!(
                nearest <= 1,
                "nearest detection {nearest} samples from true peak {truth}"
            );
        }
    }

    #[test]
    fn flat_signal_yields_no_beats() {
        let beats = detect_r_peaks(&vec![0.0; 2500], 250.0);
        assert!(beats.len() < 2);
    }

    #[test]
    fn empty_signal_yields_no_beats() {
        assert!(detect_r_peaks(&[], 250.0).is_empty());
    }

    #[test]
    fn indices_are_ascending_and_unique() {
        let fs = 250.0;
        let rr = [0.6; 14];
        let times = beat_times(0.4, &rr);
        let sig = synthetic_filtered(fs, &times, times.last().unwrap() + 0.5);
        let beats = detect_r_peaks(&sig, fs);
        assert!(beats.indices.windows(2).all(|w| w[0] < w[1]));
        assert!(beats.indices.iter().all(|&i| i < sig.len()));
    }
}
