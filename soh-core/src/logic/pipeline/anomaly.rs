//! Anomaly Classifier
//!
//! Serving rule: fused degradation strictly above a cutoff. This is not the
//! residual rule used by calibration; serving has no reference truth.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_THRESHOLD;
use crate::logic::model::{LoadedThreshold, ThresholdSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low Risk",
            RiskLabel::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    /// Value that was compared (fused degradation)
    pub value: f64,
    /// Cutoff it was compared against
    pub threshold: f64,
    pub is_anomaly: bool,
    pub risk_label: RiskLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Fixed fused-degradation cutoff. `None` serves the calibrated threshold.
    pub serving_cutoff: Option<f64>,
    /// Threshold when no calibration artifact is available
    pub fallback_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            serving_cutoff: Some(27.0),
            fallback_threshold: FALLBACK_THRESHOLD,
        }
    }
}

impl AnomalyConfig {
    /// Resolve the reported threshold, substituting the configured fallback
    pub fn effective_threshold(&self, loaded: &LoadedThreshold) -> LoadedThreshold {
        match loaded.source {
            ThresholdSource::Calibrated => *loaded,
            ThresholdSource::Fallback => LoadedThreshold {
                value: self.fallback_threshold,
                ..*loaded
            },
        }
    }

    /// Cutoff applied to every request
    pub fn resolve_cutoff(&self, loaded: &LoadedThreshold) -> f64 {
        self.serving_cutoff
            .unwrap_or_else(|| self.effective_threshold(loaded).value)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(c) = self.serving_cutoff {
            if !c.is_finite() {
                return Err(format!("serving_cutoff must be finite, got {}", c));
            }
        }
        if !self.fallback_threshold.is_finite() {
            return Err("fallback_threshold must be finite".to_string());
        }
        Ok(())
    }
}

pub struct AnomalyClassifier;

impl AnomalyClassifier {
    pub fn classify(value: f64, cutoff: f64) -> AnomalyVerdict {
        let is_anomaly = value > cutoff;
        AnomalyVerdict {
            value,
            threshold: cutoff,
            is_anomaly,
            risk_label: if is_anomaly { RiskLabel::High } else { RiskLabel::Low },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_boundary() {
        let at = AnomalyClassifier::classify(27.0, 27.0);
        assert!(!at.is_anomaly);
        assert_eq!(at.risk_label, RiskLabel::Low);

        let above = AnomalyClassifier::classify(27.0001, 27.0);
        assert!(above.is_anomaly);
        assert_eq!(above.risk_label.as_str(), "High Risk");
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_string(&RiskLabel::High).unwrap(), "\"High Risk\"");
        assert_eq!(serde_json::to_string(&RiskLabel::Low).unwrap(), "\"Low Risk\"");
    }

    #[test]
    fn test_resolve_cutoff() {
        let calibrated = LoadedThreshold::calibrated(22.5);

        assert_eq!(AnomalyConfig::default().resolve_cutoff(&calibrated), 27.0);

        let config = AnomalyConfig { serving_cutoff: None, ..Default::default() };
        assert_eq!(config.resolve_cutoff(&calibrated), 22.5);
        assert_eq!(config.resolve_cutoff(&LoadedThreshold::fallback()), FALLBACK_THRESHOLD);

        let config = AnomalyConfig { serving_cutoff: None, fallback_threshold: 15.0 };
        assert_eq!(config.resolve_cutoff(&LoadedThreshold::fallback()), 15.0);
    }
}
