//! Prediction handler
//!
//! Registry lookup, then one orchestrator run on the blocking pool.

use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use ev_soh_core::{PredictionReport, PredictionRequest, SohError};

use crate::{AppResult, AppState};
use crate::models::{PredictRequest, Vehicle};

pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PredictionReport>> {
    req.validate()?;

    let request_id = Uuid::new_v4();

    let vehicle = Vehicle::find(&state.pool, &req.user_id, &req.vehicle_id)
        .await?
        .ok_or_else(|| SohError::NotRegistered {
            user_id: req.user_id.clone(),
            vehicle_id: req.vehicle_id.clone(),
        })?;

    let request = PredictionRequest {
        input: req.input(&vehicle.battery_type),
        valuation: vehicle.valuation(Utc::now().date_naive()),
    };

    tracing::debug!(%request_id, input = ?request.input, "Prediction requested");

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.predict(&request)).await?;

    let report = result.map_err(|e| {
        tracing::error!(%request_id, error = %e, "Prediction failed");
        e
    })?;

    tracing::info!(
        %request_id,
        user_id = %req.user_id,
        vehicle_id = %req.vehicle_id,
        soh = report.predicted_soh,
        anomaly = report.anomaly_warning,
        "Prediction served"
    );

    Ok(Json(report))
}
