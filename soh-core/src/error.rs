//! Error handling

use thiserror::Error;

use crate::logic::features::LayoutMismatchError;

pub type SohResult<T> = Result<T, SohError>;

#[derive(Error, Debug)]
pub enum SohError {
    /// Registry lookup failed, nothing was computed
    #[error("Vehicle not registered: user={user_id} vehicle={vehicle_id}")]
    NotRegistered { user_id: String, vehicle_id: String },

    /// An estimator or calibration artifact is missing or corrupt
    #[error("Model unavailable: {model} ({reason})")]
    ModelUnavailable { model: String, reason: String },

    /// A stage produced something it must never produce (NaN, wrong row shape)
    #[error("Internal computation error in {stage}: {detail}")]
    InternalComputation { stage: &'static str, detail: String },

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SohError {
    pub fn model_unavailable(model: impl Into<String>, reason: impl Into<String>) -> Self {
        SohError::ModelUnavailable {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(stage: &'static str, detail: impl Into<String>) -> Self {
        SohError::InternalComputation {
            stage,
            detail: detail.into(),
        }
    }
}
