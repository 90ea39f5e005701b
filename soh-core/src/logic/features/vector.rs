//! Feature Vectors - Typed estimator inputs
//!
//! Estimators never see a dynamic map. A `FeatureRow` can only be produced
//! from `Stage1Features` or `Stage2Features`, whose `numeric()` methods fix the
//! column order at compile time against `layout.rs`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::layout::{FeatureLayout, STAGE1_NUMERIC_COUNT, STAGE2_NUMERIC_COUNT};

// ============================================================================
// REQUEST INPUT
// ============================================================================

/// Raw, user-observable inputs for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInput {
    pub battery_type: String,
    pub total_distance_km: f64,
    pub charging_time_min: f64,
}

impl VehicleInput {
    pub fn new(battery_type: impl Into<String>, total_distance_km: f64, charging_time_min: f64) -> Self {
        Self {
            battery_type: battery_type.into(),
            total_distance_km,
            charging_time_min,
        }
    }

    pub fn stage1(&self) -> Stage1Features<'_> {
        Stage1Features {
            battery_type: &self.battery_type,
            total_dist_km: self.total_distance_km,
            charging_time_min: self.charging_time_min,
        }
    }

    pub fn stage2(&self, latent: LatentFeatureVector) -> Stage2Features<'_> {
        Stage2Features {
            base: self.stage1(),
            latent,
        }
    }
}

// ============================================================================
// LATENT FEATURES
// ============================================================================

/// Stage 1 output: quantities the owner cannot observe directly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatentFeatureVector {
    pub predicted_charging_cycles: f64,
    pub predicted_efficiency: f64,
    pub predicted_battery_temp: f64,
}

impl LatentFeatureVector {
    /// Report names, in stage order
    pub const NAMES: [&'static str; 3] = ["pred_charging_cycles", "pred_efficiency", "pred_battery_temp"];

    pub fn as_array(&self) -> [f64; 3] {
        [
            self.predicted_charging_cycles,
            self.predicted_efficiency,
            self.predicted_battery_temp,
        ]
    }

    /// Named map for the response payload
    pub fn named(&self) -> BTreeMap<String, f64> {
        Self::NAMES
            .iter()
            .zip(self.as_array())
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

// ============================================================================
// TYPED STAGE INPUTS
// ============================================================================

/// Shapes a typed feature struct into an estimator row
pub trait FeatureSet {
    const LAYOUT: FeatureLayout;

    fn to_row(&self) -> FeatureRow;
}

/// Stage 1 columns: battery_type | total_dist_km, charging_time_min
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage1Features<'a> {
    pub battery_type: &'a str,
    pub total_dist_km: f64,
    pub charging_time_min: f64,
}

impl Stage1Features<'_> {
    pub fn numeric(&self) -> [f64; STAGE1_NUMERIC_COUNT] {
        [self.total_dist_km, self.charging_time_min]
    }
}

impl FeatureSet for Stage1Features<'_> {
    const LAYOUT: FeatureLayout = FeatureLayout::Stage1;

    fn to_row(&self) -> FeatureRow {
        FeatureRow {
            layout: Self::LAYOUT,
            battery_type: self.battery_type.to_string(),
            values: self.numeric().to_vec(),
        }
    }
}

/// Stage 2 columns: Stage 1 columns followed by the latent vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage2Features<'a> {
    pub base: Stage1Features<'a>,
    pub latent: LatentFeatureVector,
}

impl Stage2Features<'_> {
    pub fn numeric(&self) -> [f64; STAGE2_NUMERIC_COUNT] {
        [
            self.base.total_dist_km,
            self.base.charging_time_min,
            self.latent.predicted_charging_cycles,
            self.latent.predicted_efficiency,
            self.latent.predicted_battery_temp,
        ]
    }
}

impl FeatureSet for Stage2Features<'_> {
    const LAYOUT: FeatureLayout = FeatureLayout::Stage2;

    fn to_row(&self) -> FeatureRow {
        FeatureRow {
            layout: Self::LAYOUT,
            battery_type: self.base.battery_type.to_string(),
            values: self.numeric().to_vec(),
        }
    }
}

// ============================================================================
// FEATURE ROW
// ============================================================================

/// Layout-tagged estimator input
///
/// Fields are private: the only constructors are the `FeatureSet` impls above.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    layout: FeatureLayout,
    battery_type: String,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn battery_type(&self) -> &str {
        &self.battery_type
    }

    /// Numeric values in layout order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        self.layout
            .numeric_index(name)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "layout": self.layout,
            "layout_hash": self.layout.hash(),
            "battery_type": self.battery_type,
            "named_values": self.layout.numeric_names().iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
