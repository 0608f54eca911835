use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 20;
pub const MAX_ACTIVITY_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub member_id: Option<Uuid>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Registered,
    LoggedIn,
    PermissionsChanged,
    BlogPostCreated,
    TicketScanned,
    PasswordReset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Registered => "member_registered",
            Action::LoggedIn => "member_logged_in",
            Action::PermissionsChanged => "permissions_changed",
            Action::BlogPostCreated => "blog_post_created",
            Action::TicketScanned => "ticket_scanned",
            Action::PasswordReset => "password_reset",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ActivityQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ActivityQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT)
    }
}
