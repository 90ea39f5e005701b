//! Physics Fusion - blend model output with a closed-form decay term
//!
//! Stage 2 can be nearly flat across inputs. The physics term keeps the
//! final estimate responsive to distance and cycle count.

use serde::{Deserialize, Serialize};

use crate::error::{SohError, SohResult};
use crate::logic::features::{LatentFeatureVector, VehicleInput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Degradation points per 1000 km
    pub mileage_decay_per_1000_km: f64,
    /// Degradation points per 100 predicted cycles
    pub cycle_decay_per_100_cycles: f64,
    pub model_weight: f64,
    pub physics_weight: f64,
    pub min_degradation: f64,
    pub max_degradation: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            mileage_decay_per_1000_km: 0.15,
            cycle_decay_per_100_cycles: 0.5,
            model_weight: 0.4,
            physics_weight: 0.6,
            min_degradation: 0.0,
            max_degradation: 40.0,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            self.mileage_decay_per_1000_km,
            self.cycle_decay_per_100_cycles,
            self.model_weight,
            self.physics_weight,
            self.min_degradation,
            self.max_degradation,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("fusion constants must be finite".to_string());
        }
        if self.min_degradation < 0.0 || self.max_degradation > 100.0 || self.min_degradation > self.max_degradation {
            return Err(format!(
                "degradation bounds [{}, {}] must satisfy 0 <= min <= max <= 100",
                self.min_degradation, self.max_degradation
            ));
        }
        Ok(())
    }
}

/// Output of the fusion step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationEstimate {
    pub raw_model_degradation: f64,
    pub physics_degradation: f64,
    /// Clamped to the configured bounds
    pub final_degradation: f64,
    /// 100 - final_degradation
    pub predicted_soh: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PhysicsFusionEngine<'a> {
    config: &'a FusionConfig,
}

impl<'a> PhysicsFusionEngine<'a> {
    pub fn new(config: &'a FusionConfig) -> Self {
        Self { config }
    }

    pub fn physics_degradation(&self, total_distance_km: f64, predicted_charging_cycles: f64) -> f64 {
        let mileage_decay = (total_distance_km / 1000.0) * self.config.mileage_decay_per_1000_km;
        let cycle_decay = (predicted_charging_cycles / 100.0) * self.config.cycle_decay_per_100_cycles;
        mileage_decay + cycle_decay
    }

    pub fn fuse(
        &self,
        raw_degradation: f64,
        input: &VehicleInput,
        latent: &LatentFeatureVector,
    ) -> SohResult<DegradationEstimate> {
        let physics = self.physics_degradation(input.total_distance_km, latent.predicted_charging_cycles);
        let blended = raw_degradation * self.config.model_weight + physics * self.config.physics_weight;

        // clamp() would pass NaN through
        if !blended.is_finite() {
            return Err(SohError::internal(
                "fusion",
                format!("non-finite blend (raw={}, physics={})", raw_degradation, physics),
            ));
        }

        let final_degradation = blended.clamp(self.config.min_degradation, self.config.max_degradation);

        Ok(DegradationEstimate {
            raw_model_degradation: raw_degradation,
            physics_degradation: physics,
            final_degradation,
            predicted_soh: 100.0 - final_degradation,
        })
    }
}
