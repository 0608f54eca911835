use uuid::Uuid;
use validator::Validate;

use crate::models::activity::Action;
use crate::models::blog::{
    total_pages, BlogPage, BlogPost, BlogPostDetail, BlogPostInput, BlogQuery, CommentInput,
    CommentView, LikeState, TargetKind, FEATURED_SIDEBAR_LEN, POSTS_PER_PAGE, RELATED_POSTS_LEN,
};
use crate::models::member::Member;
use crate::services::activity;
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

pub async fn page(store: &dyn Store, query: BlogQuery) -> AppResult<BlogPage> {
    let category = query.category_filter();
    let posts = store
        .list_posts(category, query.featured, POSTS_PER_PAGE, query.offset())
        .await?;
    let total = store.count_posts(category, query.featured).await?;

    Ok(BlogPage {
        posts,
        page: query.page(),
        total_pages: total_pages(total),
        categories: store.post_categories().await?,
        featured_posts: store.featured_headlines(FEATURED_SIDEBAR_LEN).await?,
    })
}

async fn published_post(store: &dyn Store, id: Uuid) -> AppResult<BlogPost> {
    store
        .post_by_id(id)
        .await?
        .filter(|post| post.published)
        .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))
}

/// A published post with its author, comments, related posts and likes.
/// Drafts are reported as missing.
pub async fn detail(store: &dyn Store, id: Uuid) -> AppResult<BlogPostDetail> {
    let post = published_post(store, id).await?;

    let author = store.author(post.author_id).await?;
    let comments = store.comments(TargetKind::Blog, post.id).await?;
    let related_posts = store.related_headlines(&post, RELATED_POSTS_LEN).await?;
    let like_count = store.like_count(TargetKind::Blog, post.id).await?;

    Ok(BlogPostDetail {
        post,
        author,
        comments,
        related_posts,
        like_count,
    })
}

pub async fn create(store: &dyn Store, author: &Member, input: BlogPostInput) -> AppResult<BlogPost> {
    let input = input.normalized();
    input.validate()?;

    let post = store.create_post(author.id, &input).await?;
    tracing::info!(post = %post.id, author = %author.username, "Blog post created");
    activity::record(store, Some(author.id), Action::BlogPostCreated, Some(&post.title)).await;
    Ok(post)
}

async fn ensure_target(store: &dyn Store, target: TargetKind, id: Uuid) -> AppResult<()> {
    match target {
        TargetKind::Blog => published_post(store, id).await.map(|_| ()),
        TargetKind::Event => store
            .event_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Event not found".to_string())),
    }
}

pub async fn comment(
    store: &dyn Store,
    author: &Member,
    target: TargetKind,
    target_id: Uuid,
    input: CommentInput,
) -> AppResult<CommentView> {
    let input = input.normalized();
    input.validate()?;
    ensure_target(store, target, target_id).await?;

    if let Some(parent_id) = input.parent_id {
        let anchor = store
            .comment_anchor(parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
        if !anchor.is_on(target, target_id) {
            return Err(AppError::ValidationError(
                "Replies must be posted under the same item as the parent comment".to_string(),
            ));
        }
    }

    let comment = store
        .create_comment(author.id, target, target_id, &input)
        .await?;
    tracing::debug!(%target, %target_id, comment = %comment.id, "Comment added");
    Ok(comment)
}

pub async fn toggle_like(
    store: &dyn Store,
    member: &Member,
    target: TargetKind,
    target_id: Uuid,
) -> AppResult<LikeState> {
    ensure_target(store, target, target_id).await?;
    Ok(store.toggle_like(member.id, target, target_id).await?)
}
