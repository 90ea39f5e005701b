//! Calibrated Threshold
//!
//! Residual statistics from the offline calibration run and the
//! `Metric,Value` table they are persisted in. The server reads exactly the
//! `Threshold (3SD)` row at startup and falls back to a documented constant
//! when it cannot.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{FALLBACK_THRESHOLD, THRESHOLD_METRIC};
use crate::error::SohResult;

/// Residual distribution summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceResidualStatistics {
    pub mean: f64,
    pub std: f64,
    /// Sensitivity multiplier
    pub k: f64,
    /// mean + k * std
    pub threshold: f64,
}

impl ReferenceResidualStatistics {
    pub fn from_moments(mean: f64, std: f64, k: f64) -> Self {
        Self {
            mean,
            std,
            k,
            threshold: mean + k * std,
        }
    }

    pub fn is_anomalous_residual(&self, residual: f64) -> bool {
        residual > self.threshold
    }
}

/// Where the serving threshold came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Calibrated,
    Fallback,
}

/// Threshold as loaded at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadedThreshold {
    pub value: f64,
    pub source: ThresholdSource,
}

impl LoadedThreshold {
    pub fn calibrated(value: f64) -> Self {
        Self { value, source: ThresholdSource::Calibrated }
    }

    pub fn fallback() -> Self {
        Self { value: FALLBACK_THRESHOLD, source: ThresholdSource::Fallback }
    }
}

impl Default for LoadedThreshold {
    fn default() -> Self {
        Self::fallback()
    }
}

// ============================================================================
// METRICS TABLE
// ============================================================================

/// One row of `anomaly_metrics.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

impl MetricRow {
    pub fn new(metric: &str, value: f64) -> Self {
        Self { metric: metric.to_string(), value }
    }
}

pub fn write_metrics_table(path: &Path, rows: &[MetricRow]) -> SohResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_metrics_table(path: &Path) -> SohResult<Vec<MetricRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Value of a named metric, if present
pub fn read_metric(path: &Path, metric: &str) -> SohResult<Option<f64>> {
    Ok(read_metrics_table(path)?
        .into_iter()
        .find(|r| r.metric == metric)
        .map(|r| r.value))
}

/// Load the serving threshold, falling back to the documented default
pub fn load_threshold(path: &Path) -> LoadedThreshold {
    match read_metric(path, THRESHOLD_METRIC) {
        Ok(Some(value)) if value.is_finite() => {
            log::info!("Calibrated threshold loaded: {:.4} ({})", value, path.display());
            LoadedThreshold::calibrated(value)
        }
        Ok(Some(value)) => {
            log::warn!("Calibrated threshold is not finite ({}), using fallback {}", value, FALLBACK_THRESHOLD);
            LoadedThreshold::fallback()
        }
        Ok(None) => {
            log::warn!("No '{}' row in {}, using fallback {}", THRESHOLD_METRIC, path.display(), FALLBACK_THRESHOLD);
            LoadedThreshold::fallback()
        }
        Err(e) => {
            log::warn!("Calibration metrics unavailable ({}), using fallback {}", e, FALLBACK_THRESHOLD);
            LoadedThreshold::fallback()
        }
    }
}
