//! EV Battery SOH Engine
//!
//! Two-stage estimator cascade, physics fusion, anomaly flag and derived
//! valuation metrics. Transport and storage live in `ev-soh-server`.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{SohError, SohResult};
pub use logic::config::PipelineConfig;
pub use logic::features::VehicleInput;
pub use logic::metrics::ValuationContext;
pub use logic::model::{LoadedThreshold, ModelBundle, ThresholdSource};
pub use logic::pipeline::{InferenceOrchestrator, PipelineOutcome, PredictionReport, PredictionRequest};
