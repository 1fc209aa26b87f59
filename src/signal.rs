use serde::{Deserialize, Serialize};

/// One fixed-duration stretch of raw ECG at a uniform sampling rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcgWindow {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Raw amplitude samples
    pub samples: Vec<f64>,
}

impl EcgWindow {
    pub fn new(fs: f64, samples: Vec<f64>) -> Self {
        Self { fs, samples }
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.fs
    }
}

/// Detected R-peak sample indices, ascending and unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatList {
    pub indices: Vec<usize>,
}

impl BeatList {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Inter-beat (RR) intervals in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrIntervals {
    pub seconds: Vec<f64>,
}

impl RrIntervals {
    pub fn from_beats(beats: &BeatList, fs: f64) -> Self {
        let mut seconds = Vec::new();
        for w in beats.indices.windows(2) {
            seconds.push((w[1] as f64 - w[0] as f64) / fs);
        }
        Self { seconds }
    }
}
