//! Per-window orchestration: filter, detect, screen, score, project.
//!
//! Each evaluation is a pure function of one window; the pipeline always
//! terminates in a defined verdict and never errors or panics on finite
//! input, so callers need no per-window recovery wrapper.

use crate::detectors::ecg;
use crate::filter;
use crate::metrics::sqi;
use crate::signal::{BeatList, EcgWindow, RrIntervals};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recognized evaluator options. Defaults match the study setup: 250 Hz
/// recordings cut into 10 s windows, accepted at mean correlation 0.66.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub sampling_rate_hz: f64,
    pub quality_threshold: f64,
    pub window_duration_s: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 250.0,
            quality_threshold: 0.66,
            window_duration_s: 10.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sampling rate must be positive and finite, got {0}")]
    InvalidSamplingRate(f64),
    #[error("quality threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("window duration must be positive and finite, got {0}")]
    InvalidWindowDuration(f64),
}

impl EvaluatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sampling_rate_hz.is_finite() || self.sampling_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidSamplingRate(self.sampling_rate_hz));
        }
        if !self.quality_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.quality_threshold)
        {
            return Err(ConfigError::InvalidThreshold(self.quality_threshold));
        }
        if !self.window_duration_s.is_finite() || self.window_duration_s <= 0.0 {
            return Err(ConfigError::InvalidWindowDuration(self.window_duration_s));
        }
        Ok(())
    }
}

/// Terminal state of one window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowState {
    /// Beat set failed the physiological screen.
    Infeasible,
    /// Feasible rhythm, mean template correlation below threshold.
    LowQuality,
    /// Accepted window; heart rate and NN intervals are trusted.
    HighQuality,
}

/// Quality/heart-rate projection of one window evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowVerdict {
    pub state: WindowState,
    pub quality: bool,
    /// Beats per minute over the detected beat span; 0 unless accepted.
    pub heart_rate_bpm: f64,
    /// Whatever the detector found, kept for downstream inspection even
    /// when the window is rejected.
    pub beats: BeatList,
}

/// NN-interval projection of one window evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NnReport {
    /// RR intervals relabelled normal-to-normal; empty unless accepted.
    pub nn_intervals_s: Vec<f64>,
    pub heart_rate_bpm: f64,
}

struct PipelineOutcome {
    state: WindowState,
    heart_rate_bpm: f64,
    beats: BeatList,
    nn_intervals_s: Vec<f64>,
}

/// Runs the filter -> detect -> feasibility -> template -> correlation
/// pipeline for fixed-duration ECG windows.
#[derive(Debug, Clone)]
pub struct WindowEvaluator {
    cfg: EvaluatorConfig,
    detector: ecg::RPeakConfig,
}

impl Default for WindowEvaluator {
    fn default() -> Self {
        Self {
            cfg: EvaluatorConfig::default(),
            detector: ecg::RPeakConfig::default(),
        }
    }
}

impl WindowEvaluator {
    pub fn new(cfg: EvaluatorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            detector: ecg::RPeakConfig::default(),
        })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.cfg
    }

    /// Quality/heart-rate entry point: `(quality, heart_rate_bpm, beats)`.
    pub fn assess_window(&self, window: &EcgWindow) -> WindowVerdict {
        let outcome = self.run(window);
        WindowVerdict {
            state: outcome.state,
            quality: outcome.state == WindowState::HighQuality,
            heart_rate_bpm: outcome.heart_rate_bpm,
            beats: outcome.beats,
        }
    }

    /// NN-interval entry point: `(nn_intervals_s, heart_rate_bpm)`.
    /// Same pipeline as [`Self::assess_window`], different projection.
    pub fn extract_nn(&self, window: &EcgWindow) -> NnReport {
        let outcome = self.run(window);
        NnReport {
            nn_intervals_s: outcome.nn_intervals_s,
            heart_rate_bpm: outcome.heart_rate_bpm,
        }
    }

    /// Evaluate a batch of windows in parallel. Windows are independent
    /// pure computations; output order matches input order.
    pub fn assess_windows(&self, windows: &[EcgWindow]) -> Vec<WindowVerdict> {
        windows
            .par_iter()
            .map(|window| self.assess_window(window))
            .collect()
    }

    /// Cut a resampled recording into consecutive windows of the
    /// configured duration, dropping the trailing remainder.
    pub fn windows_from_recording(&self, samples: &[f64]) -> Vec<EcgWindow> {
        let fs = self.cfg.sampling_rate_hz;
        let window_len = (self.cfg.window_duration_s * fs).round() as usize;
        if window_len == 0 {
            return Vec::new();
        }
        samples
            .chunks_exact(window_len)
            .map(|chunk| EcgWindow::new(fs, chunk.to_vec()))
            .collect()
    }

    fn run(&self, window: &EcgWindow) -> PipelineOutcome {
        let fs = window.fs;
        let filtered = filter::bandpass_normalize(&window.samples, fs);
        let beats = ecg::detect_r_peaks_with_config(&filtered, fs, &self.detector);
        let report = sqi::evaluate_sqi(
            &window.samples,
            &beats,
            fs,
            window.duration(),
            self.cfg.quality_threshold,
        );

        if !report.feasible {
            debug!("window rejected: infeasible beat set ({} beats)", beats.len());
            return PipelineOutcome {
                state: WindowState::Infeasible,
                heart_rate_bpm: 0.0,
                beats,
                nn_intervals_s: Vec::new(),
            };
        }
        if !report.quality {
            debug!(
                "window rejected: mean correlation {:?} below {}",
                report.mean_correlation, self.cfg.quality_threshold
            );
            return PipelineOutcome {
                state: WindowState::LowQuality,
                heart_rate_bpm: 0.0,
                beats,
                nn_intervals_s: Vec::new(),
            };
        }

        // Feasibility guarantees at least two ascending beats, so the
        // span is positive; the guard keeps the contract total anyway.
        let first = beats.indices[0];
        let last = *beats.indices.last().unwrap_or(&first);
        let span_s = (last as f64 - first as f64) / fs;
        let heart_rate_bpm = if span_s > 0.0 {
            60.0 * beats.len() as f64 / span_s
        } else {
            0.0
        };
        let nn_intervals_s = RrIntervals::from_beats(&beats, fs).seconds;
        debug!(
            "window accepted: {} beats, {:.1} bpm, correlation {:?}",
            beats.len(),
            heart_rate_bpm,
            report.mean_correlation
        );
        PipelineOutcome {
            state: WindowState::HighQuality,
            heart_rate_bpm,
            beats,
            nn_intervals_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EvaluatorConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut cfg = EvaluatorConfig::default();
        cfg.sampling_rate_hz = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidSamplingRate(_))
        ));

        let mut cfg = EvaluatorConfig::default();
        cfg.quality_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidThreshold(_))));

        let mut cfg = EvaluatorConfig::default();
        cfg.window_duration_s = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidWindowDuration(_))
        ));
    }

    #[test]
    fn recording_split_drops_remainder() {
        let evaluator = WindowEvaluator::default();
        let samples = vec![0.0; 2500 * 3 + 123];
        let windows = evaluator.windows_from_recording(&samples);
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.len() == 2500));
        assert!(windows.iter().all(|w| w.fs == 250.0));
    }

    #[test]
    fn flat_window_is_infeasible_with_zero_outputs() {
        let evaluator = WindowEvaluator::default();
        let window = EcgWindow::new(250.0, vec![0.0; 2500]);
        let verdict = evaluator.assess_window(&window);
        assert_eq!(verdict.state, WindowState::Infeasible);
        assert!(!verdict.quality);
        assert_eq!(verdict.heart_rate_bpm, 0.0);
        assert!(verdict.beats.len() < 2);

        let nn = evaluator.extract_nn(&window);
        assert!(nn.nn_intervals_s.is_empty());
        assert_eq!(nn.heart_rate_bpm, 0.0);
    }

    #[test]
    fn empty_window_is_infeasible() {
        let evaluator = WindowEvaluator::default();
        let verdict = evaluator.assess_window(&EcgWindow::new(250.0, Vec::new()));
        assert_eq!(verdict.state, WindowState::Infeasible);
        assert_eq!(verdict.heart_rate_bpm, 0.0);
    }
}
