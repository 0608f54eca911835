use axum::extract::State;
use axum::response::Response;
use validator::Validate;

use crate::auth::CurrentMember;
use crate::models::place::PlaceInput;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, success};

pub async fn list(State(state): State<AppState>) -> AppResult<Response> {
    let places = state.store().list_places(None).await?;
    Ok(success(places, "Places retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(input): AppJson<PlaceInput>,
) -> AppResult<Response> {
    current.require_admin()?;
    let input = input.normalized();
    input.validate()?;

    let place = state.store().create_place(current.id(), &input).await?;
    tracing::info!(place = %place.name, "Place added");
    Ok(created(place, "Place added successfully"))
}
