use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::CurrentMember;
use crate::handlers::today;
use crate::models::blog::{CommentInput, TargetKind};
use crate::models::event::{EventInput, EventQuery, RsvpInput};
use crate::models::permission::Capability;
use crate::services::{blog, events};
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{created, success};

pub async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EventQuery>,
) -> AppResult<Response> {
    let listing = events::list(state.store(), query, today()).await?;
    Ok(success(listing, "Events retrieved"))
}

pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    let detail = events::detail(state.store(), id).await?;
    Ok(success(detail, "Event retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(input): AppJson<EventInput>,
) -> AppResult<Response> {
    current.require(Capability::PostEvents)?;
    let event = events::create(state.store(), current.id(), input).await?;
    Ok(created(event, "Event created successfully"))
}

pub async fn rsvp(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<RsvpInput>,
) -> AppResult<Response> {
    let rsvp = events::rsvp(state.store(), id, input, today()).await?;
    Ok(created(rsvp, "RSVP received"))
}

pub async fn rsvps(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    current.require(Capability::PostEvents)?;
    let rsvps = events::rsvps(state.store(), id).await?;
    Ok(success(rsvps, "RSVPs retrieved"))
}

pub async fn comment(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<CommentInput>,
) -> AppResult<Response> {
    let comment = blog::comment(state.store(), &current.member, TargetKind::Event, id, input).await?;
    Ok(created(comment, "Comment added"))
}
