//! Linear Estimator
//!
//! JSON artifact equivalent of `StandardScaler + OneHotEncoder + LinearRegression`:
//! numeric columns are standardised, the chemistry contributes an additive
//! offset, and unknown chemistries contribute nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::estimator::{ensure_layout, Estimator, EstimatorKind};
use crate::error::{SohError, SohResult};
use crate::logic::features::{FeatureLayout, FeatureRow};

/// Per-column standardisation parameters from training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// On-disk form of a linear estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelSpec {
    pub name: String,
    pub layout: FeatureLayout,
    pub intercept: f64,
    /// One weight per numeric column, in layout order
    pub weights: Vec<f64>,
    #[serde(default)]
    pub scaler: Option<Standardization>,
    /// Additive offset per exact battery_type value
    #[serde(default)]
    pub chemistry_offsets: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct LinearEstimator {
    spec: LinearModelSpec,
}

impl LinearEstimator {
    pub fn new(spec: LinearModelSpec) -> SohResult<Self> {
        let expected = spec.layout.numeric_count();

        if spec.weights.len() != expected {
            return Err(SohError::Artifact(format!(
                "{}: expected {} weights for {:?}, got {}",
                spec.name,
                expected,
                spec.layout,
                spec.weights.len()
            )));
        }

        if let Some(scaler) = &spec.scaler {
            if scaler.mean.len() != expected || scaler.scale.len() != expected {
                return Err(SohError::Artifact(format!(
                    "{}: scaler length does not match {:?}",
                    spec.name, spec.layout
                )));
            }
        }

        let all_finite = std::iter::once(spec.intercept)
            .chain(spec.weights.iter().copied())
            .chain(spec.chemistry_offsets.values().copied())
            .all(f64::is_finite);
        if !all_finite {
            return Err(SohError::Artifact(format!("{}: non-finite coefficient", spec.name)));
        }

        Ok(Self { spec })
    }

    /// Flat model: always predicts `value`
    pub fn constant(name: &str, layout: FeatureLayout, value: f64) -> Self {
        Self {
            spec: LinearModelSpec {
                name: name.to_string(),
                layout,
                intercept: value,
                weights: vec![0.0; layout.numeric_count()],
                scaler: None,
                chemistry_offsets: BTreeMap::new(),
            },
        }
    }

    pub fn from_slice(bytes: &[u8]) -> SohResult<Self> {
        let spec: LinearModelSpec = serde_json::from_slice(bytes)?;
        Self::new(spec)
    }

    pub fn spec(&self) -> &LinearModelSpec {
        &self.spec
    }
}

impl Estimator for LinearEstimator {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Linear
    }

    fn layout(&self) -> FeatureLayout {
        self.spec.layout
    }

    fn predict(&self, row: &FeatureRow) -> SohResult<f64> {
        ensure_layout(self, row)?;

        let mut y = self.spec.intercept
            + self
                .spec
                .chemistry_offsets
                .get(row.battery_type())
                .copied()
                .unwrap_or(0.0);

        for (i, (&x, &w)) in row.values().iter().zip(self.spec.weights.iter()).enumerate() {
            let x = match &self.spec.scaler {
                Some(s) => (x - s.mean[i]) / s.scale[i].abs().max(1e-12),
                None => x,
            };
            y += w * x;
        }

        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{FeatureSet, VehicleInput};

    fn spec() -> LinearModelSpec {
        LinearModelSpec {
            name: "cycles".to_string(),
            layout: FeatureLayout::Stage1,
            intercept: 10.0,
            weights: vec![0.01, 1.0],
            scaler: None,
            chemistry_offsets: BTreeMap::from([("LFP".to_string(), 5.0)]),
        }
    }

    #[test]
    fn test_linear_predict() {
        let est = LinearEstimator::new(spec()).unwrap();
        let row = VehicleInput::new("NMC", 1000.0, 30.0).stage1().to_row();

        // 10 + 0.01*1000 + 1.0*30
        assert!((est.predict(&row).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_chemistry_offset_and_unknown() {
        let est = LinearEstimator::new(spec()).unwrap();
        let lfp = VehicleInput::new("LFP", 0.0, 0.0).stage1().to_row();
        let other = VehicleInput::new("Solid-State", 0.0, 0.0).stage1().to_row();

        assert_eq!(est.predict(&lfp).unwrap(), 15.0);
        assert_eq!(est.predict(&other).unwrap(), 10.0);
    }

    #[test]
    fn test_standardization() {
        let mut s = spec();
        s.scaler = Some(Standardization {
            mean: vec![1000.0, 30.0],
            scale: vec![500.0, 10.0],
        });
        let est = LinearEstimator::new(s).unwrap();
        let row = VehicleInput::new("NMC", 1500.0, 40.0).stage1().to_row();

        // 10 + 0.01*1 + 1.0*1
        assert!((est.predict(&row).unwrap() - 11.01).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_wrong_weight_count() {
        let mut s = spec();
        s.weights.push(1.0);
        assert!(matches!(LinearEstimator::new(s), Err(SohError::Artifact(_))));
    }

    #[test]
    fn test_rejects_wrong_stage_row() {
        let est = LinearEstimator::constant("stage2", FeatureLayout::Stage2, 3.0);
        let row = VehicleInput::new("NMC", 1.0, 1.0).stage1().to_row();

        assert!(matches!(
            est.predict(&row),
            Err(SohError::InternalComputation { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_vec(&spec()).unwrap();
        let est = LinearEstimator::from_slice(&json).unwrap();
        assert_eq!(est.spec(), &spec());
        assert_eq!(est.kind(), EstimatorKind::Linear);
    }
}
