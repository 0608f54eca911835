use axum::extract::State;
use axum::response::Response;

use crate::auth::CurrentMember;
use crate::models::account::PasswordChange;
use crate::models::member::ProfileUpdate;
use crate::services::accounts;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::AppJson;
use crate::utils::response::{empty_success, success};

pub async fn me(current: CurrentMember) -> Response {
    let view = accounts::current_view(current.member, current.capabilities);
    success(view, "Current member")
}

pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(update): AppJson<ProfileUpdate>,
) -> AppResult<Response> {
    let member = accounts::update_profile(state.store(), &current.member, update).await?;
    let view = accounts::current_view(member, current.capabilities);
    Ok(success(view, "Profile updated successfully"))
}

pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(change): AppJson<PasswordChange>,
) -> AppResult<Response> {
    accounts::change_password(state.store(), &current.member, change).await?;
    Ok(empty_success("Password changed successfully"))
}
