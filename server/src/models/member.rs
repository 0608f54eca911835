use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::permission::{Capabilities, Role};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub location: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields written when a member signs up.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Editable profile fields, shared by self-service and admin edits.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ProfileUpdate {
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.phone = non_empty(self.phone);
        self.bio = non_empty(self.bio);
        self.profile_picture = non_empty(self.profile_picture);
        self.location = non_empty(self.location);
        self
    }
}

/// Admin edit: a profile update that may also rename the account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberUpdate {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: ProfileUpdate,
}

impl MemberUpdate {
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            profile: self.profile.normalized(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSort {
    #[default]
    Username,
    JoinDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: MemberSort,
}

/// What a signed-in member sees about themselves.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentMemberView {
    #[serde(flatten)]
    pub member: Member,
    pub role: Role,
    pub permissions: Capabilities,
}

/// Emails compare case-insensitively, so they are stored lower-cased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
