//! Central Configuration Constants
//!
//! Single source of truth for artifact names, env keys and defaults.
//! To move the model directory, only edit this file (or set the env var).

use std::path::{Path, PathBuf};

/// App name, used for the default data directory
pub const APP_NAME: &str = "ev-soh";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model manifest filename inside the model directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Calibration metrics table filename
pub const METRICS_FILE: &str = "anomaly_metrics.csv";

/// Per-row calibration output filename
pub const RESULTS_FILE: &str = "anomaly_results.csv";

/// ROC points filename
pub const ROC_FILE: &str = "roc_curve.csv";

/// The metrics-table row the server reads at startup
pub const THRESHOLD_METRIC: &str = "Threshold (3SD)";

/// Threshold used when the calibration artifact is absent
pub const FALLBACK_THRESHOLD: f64 = 10.0;

/// Human-readable provenance note attached to every report
pub const CALCULATION_NOTE: &str = "Estimates based on ANL BatPaC Model & Straight-line Depreciation.";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get model directory from environment or use default
pub fn get_model_dir() -> PathBuf {
    std::env::var("SOH_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir().join("models"))
}

/// `<model_dir>/../results/anomaly_metrics.csv`
pub fn metrics_path_for(model_dir: &Path) -> PathBuf {
    model_dir
        .parent()
        .map(|p| p.join("results"))
        .unwrap_or_else(|| PathBuf::from("results"))
        .join(METRICS_FILE)
}

/// Calibration metrics path: `SOH_METRICS_PATH`, else next to `model_dir`.
/// The server and `soh-calibrate` both resolve through here.
pub fn get_metrics_path(model_dir: &Path) -> PathBuf {
    std::env::var("SOH_METRICS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| metrics_path_for(model_dir))
}

/// Optional pipeline configuration JSON
pub fn get_pipeline_config_path() -> Option<PathBuf> {
    std::env::var("SOH_PIPELINE_CONFIG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_path_sits_beside_model_dir() {
        assert_eq!(
            metrics_path_for(Path::new("/srv/ev/models")),
            PathBuf::from("/srv/ev/results/anomaly_metrics.csv")
        );
        assert_eq!(
            metrics_path_for(Path::new("models")),
            PathBuf::from("results/anomaly_metrics.csv")
        );
    }

    #[test]
    fn test_metrics_path_follows_model_dir_without_override() {
        if std::env::var_os("SOH_METRICS_PATH").is_some() {
            return;
        }
        let model_dir = Path::new("/srv/ev/models");
        assert_eq!(get_metrics_path(model_dir), metrics_path_for(model_dir));
        // CLI writes into the parent of this path
        assert_eq!(
            get_metrics_path(model_dir).parent(),
            Some(Path::new("/srv/ev/results"))
        );
    }
}
