//! Descriptive statistics for the calibration run

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1). Zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to [0, 1]. Returns `None` for an empty slice.
pub fn quantile_linear(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Goodness of fit of predictions against reference values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl FitMetrics {
    /// `None` when the slices are empty or differ in length
    pub fn compute(truth: &[f64], predicted: &[f64]) -> Option<Self> {
        if truth.is_empty() || truth.len() != predicted.len() {
            return None;
        }

        let n = truth.len() as f64;
        let truth_mean = mean(truth);

        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut abs_sum = 0.0;
        for (t, p) in truth.iter().zip(predicted) {
            let err = t - p;
            ss_res += err * err;
            abs_sum += err.abs();
            ss_tot += (t - truth_mean).powi(2);
        }

        // Constant truth: perfect fit is 1, anything else 0
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Some(Self {
            r2,
            rmse: (ss_res / n).sqrt(),
            mae: abs_sum / n,
        })
    }
}
