use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentMember;
use crate::models::member::{MemberQuery, MemberUpdate};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::success;

pub async fn list(
    State(state): State<AppState>,
    current: CurrentMember,
    AppQuery(query): AppQuery<MemberQuery>,
) -> AppResult<Response> {
    current.require_admin()?;
    let members = state
        .store()
        .list_members(query.search.as_deref(), query.sort_by)
        .await?;
    Ok(success(members, "Members retrieved"))
}

pub async fn show(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    current.require_admin()?;
    let member = state
        .store()
        .member_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;
    Ok(success(member, "Member retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<MemberUpdate>,
) -> AppResult<Response> {
    current.require_admin()?;
    let update = update.normalized();
    update.validate()?;

    let member = state
        .store()
        .update_member(id, &update)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Username or email already exists"))?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    tracing::info!(member = %member.username, by = %current.member.username, "Member updated");
    Ok(success(member, "Member updated successfully"))
}
