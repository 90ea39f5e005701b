//! Pipeline Configuration
//!
//! Every tunable constant of the pipeline in one place. Recalibration is a
//! JSON edit, not a code change. Missing fields keep their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SohError, SohResult};
use crate::logic::calibration::CalibrationConfig;
use crate::logic::metrics::{MaterialTable, ResaleConfig, SocConfig};
use crate::logic::pipeline::{AnomalyConfig, FusionConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fusion: FusionConfig,
    pub anomaly: AnomalyConfig,
    pub soc: SocConfig,
    pub resale: ResaleConfig,
    pub materials: MaterialTable,
    pub calibration: CalibrationConfig,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> SohResult<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional path; `None` means defaults
    pub fn load_or_default(path: Option<&Path>) -> SohResult<Self> {
        match path {
            Some(p) => {
                let config = Self::load(p)?;
                log::info!("Pipeline config loaded from {}", p.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> SohResult<()> {
        self.fusion.validate().map_err(SohError::InvalidConfig)?;
        self.anomaly.validate().map_err(SohError::InvalidConfig)?;
        self.calibration.validate().map_err(SohError::InvalidConfig)?;

        if self.soc.max_soc <= 0.0 || self.soc.charge_rate_per_min < 0.0 {
            return Err(SohError::InvalidConfig(format!(
                "soc: max_soc must be > 0 and charge rate >= 0 (got {}, {})",
                self.soc.max_soc, self.soc.charge_rate_per_min
            )));
        }
        if self.resale.days_per_year <= 0.0 || self.resale.mileage_reference_km <= 0.0 {
            return Err(SohError::InvalidConfig(
                "resale: days_per_year and mileage_reference_km must be > 0".to_string(),
            ));
        }
        if self.resale.age_floor < 0.0 || self.resale.mileage_floor < 0.0 {
            return Err(SohError::InvalidConfig("resale: floors must be >= 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fusion.physics_weight, 0.6);
        assert_eq!(config.anomaly.serving_cutoff, Some(27.0));
        assert_eq!(config.soc.start_soc, 20.0);
        assert_eq!(config.calibration.k, 3.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"fusion": {"model_weight": 0.5}, "anomaly": {"serving_cutoff": null}}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.fusion.model_weight, 0.5);
        assert_eq!(config.fusion.physics_weight, 0.6);
        assert_eq!(config.anomaly.serving_cutoff, None);
        assert_eq!(config.materials, MaterialTable::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"resale": {"days_per_year": 0}}"#).unwrap();

        assert!(matches!(PipelineConfig::load(&path), Err(SohError::InvalidConfig(_))));
    }

    #[test]
    fn test_none_path_is_default() {
        assert_eq!(PipelineConfig::load_or_default(None).unwrap(), PipelineConfig::default());
    }
}
