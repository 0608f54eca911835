use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentMember;
use crate::models::permission::Capability;
use crate::models::vehicle::{VehicleInput, VehicleQuery};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{created, success};

const DUPLICATE_PLATE: &str = "License plate already registered";

pub async fn list(
    State(state): State<AppState>,
    _current: CurrentMember,
    AppQuery(query): AppQuery<VehicleQuery>,
) -> AppResult<Response> {
    let vehicles = state.store().list_vehicles(&query).await?;
    Ok(success(vehicles, "Vehicles retrieved"))
}

pub async fn show(
    State(state): State<AppState>,
    _current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    let vehicle = state
        .store()
        .vehicle_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
    Ok(success(vehicle, "Vehicle retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(input): AppJson<VehicleInput>,
) -> AppResult<Response> {
    current.require(Capability::ManageVehicles)?;
    let input = input.normalized();
    input.validate()?;

    let vehicle = state
        .store()
        .create_vehicle(current.id(), &input)
        .await
        .map_err(|e| AppError::on_unique_violation(e, DUPLICATE_PLATE))?;

    tracing::info!(plate = %vehicle.license_plate, owner = %current.member.username, "Vehicle registered");
    Ok(created(vehicle, "Vehicle registered successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<VehicleInput>,
) -> AppResult<Response> {
    current.require(Capability::ManageVehicles)?;
    let input = input.normalized();
    input.validate()?;

    let vehicle = state
        .store()
        .update_vehicle(id, &input)
        .await
        .map_err(|e| AppError::on_unique_violation(e, DUPLICATE_PLATE))?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
    Ok(success(vehicle, "Vehicle updated successfully"))
}
