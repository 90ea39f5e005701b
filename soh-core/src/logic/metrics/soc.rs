//! State-of-Charge estimate
//!
//! Piecewise-linear DC fast-charge curve for a ~60 kWh pack on a ~50 kW
//! charger: linear gain up to the taper point, half speed after it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocConfig {
    /// Assumed SOC when the session starts (%)
    pub start_soc: f64,
    /// Gain below the taper point (% per minute)
    pub charge_rate_per_min: f64,
    /// SOC where tapering begins (%)
    pub taper_start_soc: f64,
    /// Added-SOC offset subtracted in the taper branch. Fixed to the charge
    /// profile, not derived from `start_soc`.
    pub taper_offset: f64,
    /// Speed factor in the taper region
    pub taper_rate_factor: f64,
    pub max_soc: f64,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            start_soc: 20.0,
            charge_rate_per_min: 1.38,
            taper_start_soc: 80.0,
            taper_offset: 60.0,
            taper_rate_factor: 0.5,
            max_soc: 100.0,
        }
    }
}

/// SOC reached after `charging_time_min`, clamped to [0, max_soc]
pub fn estimate_soc(charging_time_min: f64, config: &SocConfig) -> f64 {
    let added = charging_time_min * config.charge_rate_per_min;

    let soc = if config.start_soc + added > config.taper_start_soc {
        let excess = added - config.taper_offset;
        config.taper_start_soc + excess * config.taper_rate_factor
    } else {
        config.start_soc + added
    };

    soc.clamp(0.0, config.max_soc)
}
