use serde::{Deserialize, Serialize};

/// Time-domain statistics over quality-gated NN intervals (seconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NnTimeStats {
    pub n: usize,
    pub avnn: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub pnn50: f64,
}

pub fn nn_time_stats(nn_s: &[f64]) -> NnTimeStats {
    let n = nn_s.len();
    let avnn = if n > 0 {
        nn_s.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };
    let sdnn = if n > 1 {
        (nn_s.iter().map(|x| (x - avnn).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };
    let rmssd = if n > 1 {
        let diffs = nn_s.windows(2).map(|w| (w[1] - w[0]).powi(2));
        (diffs.sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };
    let pnn50 = if n > 1 {
        let count = nn_s.windows(2).filter(|w| (w[1] - w[0]).abs() > 0.050).count();
        count as f64 / (n as f64 - 1.0)
    } else {
        0.0
    };

    NnTimeStats {
        n,
        avnn,
        sdnn,
        rmssd,
        pnn50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_intervals_have_no_variability() {
        let stats = nn_time_stats(&[0.8, 0.8, 0.8]);
        assert_eq!(stats.n, 3);
        assert!((stats.avnn - 0.8).abs() < 1e-12);
        assert!(stats.sdnn.abs() < 1e-12);
        assert!(stats.rmssd.abs() < 1e-12);
        assert!(stats.pnn50.abs() < 1e-12);
    }

    #[test]
    fn two_interval_stats() {
        let stats = nn_time_stats(&[0.8, 0.9]);
        assert!((stats.avnn - 0.85).abs() < 1e-12);
        assert!((stats.rmssd - 0.1).abs() < 1e-12);
        assert!((stats.pnn50 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_intervals_are_all_zero() {
        let stats = nn_time_stats(&[]);
        assert_eq!(stats.n, 0);
        assert_eq!(stats.avnn, 0.0);
        assert_eq!(stats.sdnn, 0.0);
    }
}
