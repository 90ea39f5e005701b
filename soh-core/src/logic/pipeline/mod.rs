//! Pipeline Module - Per-request inference cascade
//!
//! Chạy tuần tự, không có state dùng chung nào bị thay đổi trong request.

pub mod anomaly;
pub mod degradation;
pub mod fusion;
pub mod latent;
pub mod orchestrator;

#[cfg(test)]
mod tests;

// Re-export common types
pub use anomaly::{AnomalyClassifier, AnomalyConfig, AnomalyVerdict, RiskLabel};
pub use degradation::DegradationStage;
pub use fusion::{DegradationEstimate, FusionConfig, PhysicsFusionEngine};
pub use latent::LatentFeatureStage;
pub use orchestrator::{InferenceOrchestrator, PipelineOutcome, PredictionReport, PredictionRequest};
