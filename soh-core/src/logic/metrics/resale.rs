//! Resale value (straight-line depreciation)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResaleConfig {
    /// Value lost per year of age
    pub age_depreciation_per_year: f64,
    pub age_floor: f64,
    /// Distance at which the mileage factor reaches zero (before the floor)
    pub mileage_reference_km: f64,
    pub mileage_floor: f64,
    pub days_per_year: f64,
}

impl Default for ResaleConfig {
    fn default() -> Self {
        Self {
            age_depreciation_per_year: 0.08,
            age_floor: 0.3,
            mileage_reference_km: 180_000.0,
            mileage_floor: 0.4,
            days_per_year: 365.0,
        }
    }
}

/// Purchase facts from the vehicle registry plus the valuation date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationContext {
    pub buying_price: f64,
    pub buying_date: NaiveDate,
    /// Injected so repeated runs are identical
    pub today: NaiveDate,
}

impl ValuationContext {
    pub fn age_years(&self, config: &ResaleConfig) -> f64 {
        (self.today - self.buying_date).num_days() as f64 / config.days_per_year
    }
}

pub fn estimate_resale(
    context: &ValuationContext,
    total_distance_km: f64,
    predicted_soh: f64,
    config: &ResaleConfig,
) -> f64 {
    let age_years = context.age_years(config);

    let age_factor = (1.0 - age_years * config.age_depreciation_per_year).max(config.age_floor);
    let mileage_factor = (1.0 - total_distance_km / config.mileage_reference_km).max(config.mileage_floor);
    let soh_factor = predicted_soh / 100.0;

    context.buying_price * age_factor * mileage_factor * soh_factor
}
