//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the estimator column schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add column → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove column → increment FEATURE_VERSION
//!
//! Every estimator artifact records the layout version and hash it was fit
//! against. Loading an artifact whose hash differs from the one computed here
//! is refused, because a reordered column silently corrupts predictions.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when any layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Categorical column, always first in both stages
pub const CATEGORICAL_FEATURE: &str = "battery_type";

/// Stage 1 numeric columns, in exact order
pub const STAGE1_NUMERIC: &[&str] = &[
    "total_dist_km",      // 0: Cumulative distance (km)
    "charging_time_min",  // 1: Charging duration (min)
];

/// Stage 2 numeric columns, in exact order
pub const STAGE2_NUMERIC: &[&str] = &[
    "total_dist_km",         // 0: Cumulative distance (km)
    "charging_time_min",     // 1: Charging duration (min)
    "pred_charging_cycles",  // 2: Latent - equivalent full cycles
    "pred_efficiency",       // 3: Latent - efficiency (%)
    "pred_battery_temp",     // 4: Latent - pack temperature (°C)
];

/// IMPORTANT: Must match STAGE1_NUMERIC.len()!
pub const STAGE1_NUMERIC_COUNT: usize = 2;

/// IMPORTANT: Must match STAGE2_NUMERIC.len()!
pub const STAGE2_NUMERIC_COUNT: usize = 5;

/// Which estimator stage a feature row is shaped for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLayout {
    Stage1,
    Stage2,
}

impl FeatureLayout {
    pub fn numeric_names(self) -> &'static [&'static str] {
        match self {
            FeatureLayout::Stage1 => STAGE1_NUMERIC,
            FeatureLayout::Stage2 => STAGE2_NUMERIC,
        }
    }

    pub fn numeric_count(self) -> usize {
        match self {
            FeatureLayout::Stage1 => STAGE1_NUMERIC_COUNT,
            FeatureLayout::Stage2 => STAGE2_NUMERIC_COUNT,
        }
    }

    /// All columns, categorical first
    pub fn column_names(self) -> Vec<&'static str> {
        std::iter::once(CATEGORICAL_FEATURE)
            .chain(self.numeric_names().iter().copied())
            .collect()
    }

    /// Index of a numeric column by name
    pub fn numeric_index(self, name: &str) -> Option<usize> {
        self.numeric_names().iter().position(|&n| n == name)
    }

    // ========================================================================
    // LAYOUT HASH
    // ========================================================================

    /// CRC32 of version + column names, used to detect mismatches at load time
    pub fn hash(self) -> u32 {
        let mut hasher = Hasher::new();

        hasher.update(&[FEATURE_VERSION]);

        for name in self.column_names() {
            hasher.update(name.as_bytes());
            hasher.update(&[0]); // Separator
        }

        hasher.finalize()
    }

    /// Validate that an artifact's recorded layout matches this one
    pub fn validate(self, version: u8, hash: u32) -> Result<(), LayoutMismatchError> {
        let current_hash = self.hash();

        if version != FEATURE_VERSION || hash != current_hash {
            return Err(LayoutMismatchError {
                layout: self,
                expected_version: FEATURE_VERSION,
                expected_hash: current_hash,
                actual_version: version,
                actual_hash: hash,
            });
        }

        Ok(())
    }

    pub fn info(self) -> LayoutInfo {
        LayoutInfo {
            layout: self,
            version: FEATURE_VERSION,
            hash: self.hash(),
            columns: self.column_names().iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub layout: FeatureLayout,
    pub version: u8,
    pub hash: u32,
    pub columns: Vec<String>,
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when an artifact's feature layout doesn't match expected
#[derive(Debug, Clone, Error)]
#[error(
    "Feature layout mismatch ({layout:?}): expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub layout: FeatureLayout,
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

// ============================================================================
// TESTS
// ============================================================================
