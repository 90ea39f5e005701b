//! Model Module - Estimators & Calibrated Threshold
//!
//! Tách logic inference khỏi pipeline: the cascade only sees the
//! `Estimator` trait and an immutable `ModelBundle`.

pub mod bundle;
pub mod estimator;
pub mod linear;
pub mod onnx;
pub mod threshold;

#[cfg(test)]
mod tests;

// Re-export common types
pub use bundle::{ArtifactEntry, BundleStatus, ModelBundle, ModelManifest, ModelRole};
pub use estimator::{Estimator, EstimatorKind};
pub use linear::{LinearEstimator, LinearModelSpec, Standardization};
pub use onnx::{encode_row, OnnxEstimator};
pub use threshold::{LoadedThreshold, ReferenceResidualStatistics, ThresholdSource};
