use axum::extract::State;
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::CurrentMember;
use crate::models::permission::{Capabilities, Role};
use crate::services::permissions;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::success;

#[derive(Serialize)]
struct RoleChange {
    member_id: Uuid,
    role: Role,
    permissions: Capabilities,
}

pub async fn overview(State(state): State<AppState>, current: CurrentMember) -> AppResult<Response> {
    current.require_admin()?;
    let rows = permissions::overview(state.store()).await?;
    Ok(success(rows, "Permissions retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(member_id): AppPath<Uuid>,
    AppJson(capabilities): AppJson<Capabilities>,
) -> AppResult<Response> {
    current.require_admin()?;
    let role = permissions::update(state.store(), Some(current.id()), member_id, capabilities).await?;
    let change = RoleChange {
        member_id,
        role,
        permissions: capabilities,
    };
    Ok(success(change, "Permissions updated successfully"))
}
