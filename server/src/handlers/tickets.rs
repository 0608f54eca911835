use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::auth::{CurrentMember, OptionalMember};
use crate::handlers::today;
use crate::models::ticket::{PurchaseInput, ScanRequest};
use crate::services::tickets;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

pub async fn available_events(State(state): State<AppState>) -> AppResult<Response> {
    let events = tickets::available_events(state.store(), today()).await?;
    Ok(success(events, "Events available for purchase"))
}

pub async fn purchase(
    State(state): State<AppState>,
    OptionalMember(current): OptionalMember,
    AppJson(input): AppJson<PurchaseInput>,
) -> AppResult<Response> {
    let purchaser = current.map(|c| c.id());
    let ticket = tickets::purchase(state.store(), input, purchaser).await?;
    Ok(created(ticket, "Ticket purchased successfully"))
}

pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Response> {
    let ticket = tickets::view(state.store(), &id).await?;
    Ok(success(ticket, "Ticket retrieved"))
}

pub async fn qr(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Response> {
    let (id, png) = tickets::qr_png(state.store(), &id).await?;
    let disposition = format!("attachment; filename=ticket_{}.png", id);
    Ok((
        [
            (CONTENT_TYPE, "image/png".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

pub async fn scan(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(request): AppJson<ScanRequest>,
) -> AppResult<Response> {
    let summary = tickets::scan(state.store(), &request.ticket_id, &current.member, today()).await?;
    Ok(success(summary, "Ticket validated. Entry granted."))
}

pub async fn expire(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<String>,
) -> AppResult<Response> {
    current.require_admin()?;
    let ticket = tickets::expire(state.store(), &id).await?;
    Ok(success(ticket, "Ticket expired"))
}

pub async fn expire_past(State(state): State<AppState>, current: CurrentMember) -> AppResult<Response> {
    current.require_admin()?;
    let count = tickets::expire_past_events(state.store(), today()).await?;
    Ok(success(count, "Past event tickets expired"))
}

pub async fn dashboard(State(state): State<AppState>, current: CurrentMember) -> AppResult<Response> {
    current.require_admin()?;
    let dashboard = tickets::dashboard(state.store()).await?;
    Ok(success(dashboard, "Ticket dashboard loaded"))
}
