//! Prediction request model

use serde::Deserialize;
use validator::Validate;

use ev_soh_core::VehicleInput;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "vehicle_id is required"))]
    pub vehicle_id: String,
    #[serde(alias = "total_dist_km")]
    #[validate(range(min = 0.0, message = "total_distance_km must be >= 0"))]
    pub total_distance_km: f64,
    #[validate(range(min = 0.0, message = "charging_time_min must be >= 0"))]
    pub charging_time_min: f64,
}

impl PredictRequest {
    /// Chemistry comes from the registry, not the request
    pub fn input(&self, battery_type: &str) -> VehicleInput {
        VehicleInput::new(battery_type, self.total_distance_km, self.charging_time_min)
    }
}
