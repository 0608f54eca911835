use axum::extract::State;
use axum::response::Response;

use crate::auth::CurrentMember;
use crate::handlers::today;
use crate::services::dashboard;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::response::success;

pub async fn show(State(state): State<AppState>, current: CurrentMember) -> AppResult<Response> {
    let view = dashboard::for_member(state.store(), &current, today()).await?;
    Ok(success(view, "Dashboard loaded"))
}
