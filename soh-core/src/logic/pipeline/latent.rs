//! Stage 1 - latent feature prediction
//!
//! Ba estimator độc lập, cùng input, thứ tự cố định:
//! charging_cycles, efficiency, battery_temp.

use crate::error::{SohError, SohResult};
use crate::logic::features::{FeatureSet, LatentFeatureVector, VehicleInput};
use crate::logic::model::{Estimator, ModelBundle, ModelRole};

const STAGE: &str = "latent";

/// Scalar prediction that must be finite
pub(crate) fn finite(stage: &'static str, estimator: &dyn Estimator, value: f64) -> SohResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SohError::internal(
            stage,
            format!("{} returned non-finite value {}", estimator.name(), value),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LatentFeatureStage<'a> {
    bundle: &'a ModelBundle,
}

impl<'a> LatentFeatureStage<'a> {
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn predict_latent(&self, input: &VehicleInput) -> SohResult<LatentFeatureVector> {
        // Resolve all three first so a missing slot never costs an inference
        let cycles = self.bundle.get(ModelRole::ChargingCycles)?;
        let efficiency = self.bundle.get(ModelRole::Efficiency)?;
        let temp = self.bundle.get(ModelRole::BatteryTemp)?;

        let row = input.stage1().to_row();

        let latent = LatentFeatureVector {
            predicted_charging_cycles: finite(STAGE, cycles, cycles.predict(&row)?)?,
            predicted_efficiency: finite(STAGE, efficiency, efficiency.predict(&row)?)?,
            predicted_battery_temp: finite(STAGE, temp, temp.predict(&row)?)?,
        };

        log::debug!("Stage 1 {:?} -> {:?}", row.to_log_entry(), latent);
        Ok(latent)
    }
}
