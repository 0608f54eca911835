use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::member::non_empty;

pub const POSTS_PER_PAGE: i64 = 10;
pub const FEATURED_SIDEBAR_LEN: i64 = 5;
pub const RELATED_POSTS_LEN: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub featured: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short reference used by sidebars and "related" lists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostHeadline {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BlogPostInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "yes")]
    pub published: bool,
}

impl BlogPostInput {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            category: non_empty(self.category),
            tags: non_empty(self.tags),
            featured: self.featured,
            published: self.published,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub page: Option<i64>,
}

impl BlogQuery {
    /// `"all"` and blank mean no category filter.
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * POSTS_PER_PAGE
    }
}

pub fn total_pages(total_posts: i64) -> i64 {
    (total_posts + POSTS_PER_PAGE - 1) / POSTS_PER_PAGE
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPage {
    pub posts: Vec<BlogPost>,
    pub page: i64,
    pub total_pages: i64,
    pub categories: Vec<String>,
    pub featured_posts: Vec<PostHeadline>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPostDetail {
    pub post: BlogPost,
    pub author: Option<Author>,
    pub comments: Vec<CommentView>,
    pub related_posts: Vec<PostHeadline>,
    pub like_count: i64,
}

/// What a comment or like is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Blog,
    Event,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Blog => "blog",
            TargetKind::Event => "event",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comment joined with its author's name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub author_first_name: String,
    pub author_last_name: String,
}

/// What an existing comment is attached to. Replies must share it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CommentAnchor {
    pub target_type: String,
    pub target_id: Uuid,
}

impl CommentAnchor {
    pub fn is_on(&self, target: TargetKind, target_id: Uuid) -> bool {
        self.target_type == target.as_str() && self.target_id == target_id
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl CommentInput {
    pub fn normalized(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
            parent_id: self.parent_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }

    #[test]
    fn test_page_and_offset_clamp_to_first_page() {
        let query = BlogQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.offset(), 0);

        let query = BlogQuery {
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_all_category_means_no_filter() {
        let query = BlogQuery {
            category: Some("All".to_string()),
            ..Default::default()
        };
        assert_eq!(query.category_filter(), None);

        let query = BlogQuery {
            category: Some(" builds ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.category_filter(), Some("builds"));
    }

    #[test]
    fn test_anchor_matches_kind_and_id() {
        let id = Uuid::new_v4();
        let anchor = CommentAnchor {
            target_type: "event".to_string(),
            target_id: id,
        };
        assert!(anchor.is_on(TargetKind::Event, id));
        assert!(!anchor.is_on(TargetKind::Blog, id));
        assert!(!anchor.is_on(TargetKind::Event, Uuid::new_v4()));
    }

    #[test]
    fn test_posts_publish_by_default() {
        let input: BlogPostInput =
            serde_json::from_str(r#"{"title":"First drive","content":"Went well."}"#).unwrap();
        assert!(input.published);
        assert!(!input.featured);
    }
}
