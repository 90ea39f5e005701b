//! Logic Module - SOH Engine
//!
//! Chứa các engine xử lý: Features, Model, Pipeline, Metrics, Calibration.
//!
//! ## Layout
//! - `features/` - Typed estimator inputs (stage 1, stage 2) + layout hash
//! - `model/` - Estimators (linear JSON, ONNX), bundle, calibrated threshold
//! - `pipeline/` - Per-request cascade, fusion, anomaly classification
//! - `metrics/` - SOC, resale value, material content
//! - `calibration/` - Offline residual threshold + ROC self-validation

pub mod calibration;
pub mod config;
pub mod features;
pub mod metrics;
pub mod model;
pub mod pipeline;
