//! Vehicle registry handlers

use axum::{extract::{Path, State}, Json};
use serde_json::{json, Value};
use validator::Validate;

use crate::{AppError, AppResult, AppState};
use crate::models::{Vehicle, VehicleList, VehicleRegister};

/// Register a vehicle; a duplicate is reported, not rejected
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<VehicleRegister>,
) -> AppResult<Json<Value>> {
    req.validate()?;

    if !Vehicle::register(&state.pool, &req).await? {
        tracing::debug!(user_id = %req.user_id, vehicle_id = %req.vehicle_id, "Vehicle already registered");
        return Ok(Json(json!({ "message": "Vehicle already saved" })));
    }

    tracing::info!(user_id = %req.user_id, vehicle_id = %req.vehicle_id, battery_type = %req.battery_type, "Vehicle registered");
    Ok(Json(json!({ "message": "Vehicle Registered Successfully" })))
}

/// Update purchase facts and chemistry
pub async fn update(
    State(state): State<AppState>,
    Json(req): Json<VehicleRegister>,
) -> AppResult<Json<Value>> {
    req.validate()?;

    if !Vehicle::update(&state.pool, &req).await? {
        return Err(AppError::NotFound("Vehicle Not Registered".to_string()));
    }

    Ok(Json(json!({ "message": "Vehicle Updated Successfully" })))
}

/// List a user's vehicles
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<VehicleList>> {
    let vehicles = Vehicle::list_by_user(&state.pool, &user_id).await?;
    Ok(Json(VehicleList { vehicles }))
}
