use axum::extract::State;
use axum::response::Response;

use crate::auth::CurrentMember;
use crate::models::activity::ActivityQuery;
use crate::services::activity;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::AppQuery;
use crate::utils::response::success;

pub async fn recent(
    State(state): State<AppState>,
    current: CurrentMember,
    AppQuery(query): AppQuery<ActivityQuery>,
) -> AppResult<Response> {
    current.require_admin()?;
    let entries = activity::recent(state.store(), query).await?;
    Ok(success(entries, "Activity retrieved"))
}
