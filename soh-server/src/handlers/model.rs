//! Model status handler

use axum::{extract::State, Json};
use serde::Serialize;

use ev_soh_core::logic::features::{FeatureLayout, LayoutInfo, FEATURE_VERSION};
use ev_soh_core::logic::model::BundleStatus;
use ev_soh_core::LoadedThreshold;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub bundle: BundleStatus,
    /// Threshold reported with every prediction
    pub threshold: LoadedThreshold,
    /// Cutoff the anomaly flag is computed against
    pub serving_cutoff: f64,
    pub feature_version: u8,
    pub layouts: Vec<LayoutInfo>,
}

pub async fn status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    let engine = &state.engine;
    Json(ModelStatusResponse {
        bundle: engine.bundle().status(),
        threshold: engine.threshold(),
        serving_cutoff: engine.cutoff(),
        feature_version: FEATURE_VERSION,
        layouts: vec![FeatureLayout::Stage1.info(), FeatureLayout::Stage2.info()],
    })
}
