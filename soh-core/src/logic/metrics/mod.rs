//! Derived Metrics - SOC, resale value, material content
//!
//! Pure functions of the request inputs and the final SOH. Nothing here can
//! fail; edge cases are absorbed by clamps and floors.

pub mod materials;
pub mod resale;
pub mod soc;

use serde::{Deserialize, Serialize};

use crate::logic::features::VehicleInput;

pub use materials::{MaterialComposition, MaterialProfile, MaterialTable};
pub use resale::{estimate_resale, ResaleConfig, ValuationContext};
pub use soc::{estimate_soc, SocConfig};

/// Secondary metrics for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub estimated_soc: f64,
    pub resale_value_usd: f64,
    pub material_composition: MaterialComposition,
}

#[derive(Debug, Clone)]
pub struct DerivedMetricsCalculator<'a> {
    pub soc: &'a SocConfig,
    pub resale: &'a ResaleConfig,
    pub materials: &'a MaterialTable,
}

impl DerivedMetricsCalculator<'_> {
    pub fn calculate(
        &self,
        input: &VehicleInput,
        predicted_soh: f64,
        context: &ValuationContext,
    ) -> ValuationResult {
        ValuationResult {
            estimated_soc: estimate_soc(input.charging_time_min, self.soc),
            resale_value_usd: estimate_resale(context, input.total_distance_km, predicted_soh, self.resale)
                .max(0.0),
            material_composition: self.materials.composition_for(&input.battery_type),
        }
    }
}
