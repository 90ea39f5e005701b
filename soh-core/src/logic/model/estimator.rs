//! Estimator capability
//!
//! The pipeline depends only on this trait: one typed row in, one scalar out.
//! How the estimator was fit (forest, boosting, linear) is not its concern.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{SohError, SohResult};
use crate::logic::features::{FeatureLayout, FeatureRow};

/// Serialized estimator formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Standardised linear model with one-hot chemistry offsets (JSON)
    Linear,
    /// Any regressor exported to ONNX
    Onnx,
}

/// Trait for trained regressors (linear JSON, ONNX, ...)
pub trait Estimator: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> EstimatorKind;

    /// Layout this estimator was fit against
    fn layout(&self) -> FeatureLayout;

    fn predict(&self, row: &FeatureRow) -> SohResult<f64>;
}

/// Refuse rows shaped for another stage
pub(crate) fn ensure_layout(estimator: &dyn Estimator, row: &FeatureRow) -> SohResult<()> {
    if row.layout() != estimator.layout() {
        return Err(SohError::internal(
            "estimator",
            format!(
                "{} expects {:?} rows, got {:?}",
                estimator.name(),
                estimator.layout(),
                row.layout()
            ),
        ));
    }
    Ok(())
}
