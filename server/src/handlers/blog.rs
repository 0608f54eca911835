use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::CurrentMember;
use crate::models::blog::{BlogPostInput, BlogQuery, CommentInput, TargetKind};
use crate::services::blog;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{created, success};

pub async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BlogQuery>,
) -> AppResult<Response> {
    let page = blog::page(state.store(), query).await?;
    Ok(success(page, "Blog posts retrieved"))
}

pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    let detail = blog::detail(state.store(), id).await?;
    Ok(success(detail, "Blog post retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentMember,
    AppJson(input): AppJson<BlogPostInput>,
) -> AppResult<Response> {
    let post = blog::create(state.store(), &current.member, input).await?;
    Ok(created(post, "Blog post created successfully"))
}

pub async fn comment(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<CommentInput>,
) -> AppResult<Response> {
    let comment = blog::comment(state.store(), &current.member, TargetKind::Blog, id, input).await?;
    Ok(created(comment, "Comment added"))
}

pub async fn like(
    State(state): State<AppState>,
    current: CurrentMember,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    let like = blog::toggle_like(state.store(), &current.member, TargetKind::Blog, id).await?;
    let message = if like.liked { "Post liked" } else { "Like removed" };
    Ok(success(like, message))
}
