//! Persistence for every domain entity.
//!
//! Handlers and services only see [`Store`]. The concrete backend is picked
//! once at startup by [`connect`] and shared as `Arc<dyn Store>`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::models::activity::ActivityEntry;
use crate::models::blog::{
    Author, BlogPost, BlogPostInput, CommentAnchor, CommentInput, CommentView, LikeState,
    PostHeadline, TargetKind,
};
use crate::models::event::{Event, EventFilter, NewEvent, Rsvp, RsvpInput};
use crate::models::member::{Member, MemberSort, MemberUpdate, NewMember, ProfileUpdate};
use crate::models::permission::{Capabilities, MemberCapabilities};
use crate::models::place::{Place, PlaceInput};
use crate::models::ticket::{NewTicket, TicketId, TicketStatus, TicketWithEvent};
use crate::models::vehicle::{Vehicle, VehicleInput, VehicleListing, VehicleQuery};

mod postgres;
mod sql;
mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Per-status ticket aggregate: `(status, ticket count, summed price cents)`.
pub type StatusGroup = (TicketStatus, i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Infers the backend from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Backend> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Backend::Sqlite)
        } else {
            None
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown database backend '{other}'")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres => f.write_str("postgres"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError>;

    // Members

    /// Inserts the member and an all-false permission row atomically.
    async fn create_member(&self, member: &NewMember) -> StoreResult<Member>;
    async fn member_by_id(&self, id: Uuid) -> StoreResult<Option<Member>>;
    async fn member_by_username(&self, username: &str) -> StoreResult<Option<Member>>;
    async fn member_by_email(&self, email: &str) -> StoreResult<Option<Member>>;
    async fn list_members(&self, search: Option<&str>, sort: MemberSort)
        -> StoreResult<Vec<Member>>;
    async fn update_member(&self, id: Uuid, update: &MemberUpdate) -> StoreResult<Option<Member>>;
    async fn update_profile(&self, id: Uuid, profile: &ProfileUpdate)
        -> StoreResult<Option<Member>>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;
    async fn count_members(&self) -> StoreResult<i64>;

    // Permissions

    async fn capabilities(&self, member_id: Uuid) -> StoreResult<Option<Capabilities>>;
    async fn set_capabilities(&self, member_id: Uuid, caps: Capabilities) -> StoreResult<()>;
    async fn list_member_capabilities(&self) -> StoreResult<Vec<MemberCapabilities>>;

    // Vehicles

    async fn list_vehicles(&self, query: &VehicleQuery) -> StoreResult<Vec<VehicleListing>>;
    async fn vehicle_by_id(&self, id: Uuid) -> StoreResult<Option<VehicleListing>>;
    async fn create_vehicle(&self, owner: Uuid, input: &VehicleInput) -> StoreResult<Vehicle>;
    async fn update_vehicle(&self, id: Uuid, input: &VehicleInput) -> StoreResult<Option<Vehicle>>;
    async fn count_vehicles(&self) -> StoreResult<i64>;

    // Places

    async fn list_places(&self, limit: Option<i64>) -> StoreResult<Vec<Place>>;
    async fn place_by_id(&self, id: Uuid) -> StoreResult<Option<Place>>;
    async fn create_place(&self, added_by: Uuid, input: &PlaceInput) -> StoreResult<Place>;

    // Events and RSVPs

    async fn list_events(
        &self,
        search: Option<&str>,
        filter: Option<EventFilter>,
        today: NaiveDate,
    ) -> StoreResult<Vec<Event>>;
    async fn latest_events(&self, limit: i64) -> StoreResult<Vec<Event>>;
    async fn upcoming_events(&self, today: NaiveDate) -> StoreResult<Vec<Event>>;
    async fn count_upcoming_events(&self, today: NaiveDate) -> StoreResult<i64>;
    async fn event_by_id(&self, id: Uuid) -> StoreResult<Option<Event>>;
    async fn create_event(&self, event: &NewEvent) -> StoreResult<Event>;
    /// Sum of `attendees` over the event's RSVPs.
    async fn attendee_count(&self, event_id: Uuid) -> StoreResult<i64>;
    async fn create_rsvp(&self, event_id: Uuid, input: &RsvpInput) -> StoreResult<Rsvp>;
    async fn list_rsvps(&self, event_id: Uuid) -> StoreResult<Vec<Rsvp>>;

    // Tickets

    async fn insert_ticket(&self, ticket: &NewTicket) -> StoreResult<()>;
    async fn ticket_with_event(&self, id: &TicketId) -> StoreResult<Option<TicketWithEvent>>;
    /// `valid -> used`. Returns false when the ticket was not `valid` any more.
    async fn mark_ticket_used(
        &self,
        id: &TicketId,
        scanned_at: DateTime<Utc>,
        scanned_by: &str,
    ) -> StoreResult<bool>;
    /// `from -> expired`. Returns false when the ticket was no longer in `from`.
    async fn expire_ticket(&self, id: &TicketId, from: TicketStatus) -> StoreResult<bool>;
    async fn expire_tickets_before(&self, today: NaiveDate) -> StoreResult<u64>;
    async fn ticket_status_groups(&self) -> StoreResult<Vec<StatusGroup>>;
    async fn recent_tickets(&self, limit: i64) -> StoreResult<Vec<TicketWithEvent>>;

    // Blog

    async fn list_posts(
        &self,
        category: Option<&str>,
        featured_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<BlogPost>>;
    async fn count_posts(&self, category: Option<&str>, featured_only: bool) -> StoreResult<i64>;
    async fn post_categories(&self) -> StoreResult<Vec<String>>;
    async fn featured_headlines(&self, limit: i64) -> StoreResult<Vec<PostHeadline>>;
    async fn related_headlines(&self, post: &BlogPost, limit: i64)
        -> StoreResult<Vec<PostHeadline>>;
    async fn post_by_id(&self, id: Uuid) -> StoreResult<Option<BlogPost>>;
    async fn author(&self, member_id: Uuid) -> StoreResult<Option<Author>>;
    async fn create_post(&self, author_id: Uuid, input: &BlogPostInput) -> StoreResult<BlogPost>;

    // Comments and likes

    async fn comments(&self, target: TargetKind, target_id: Uuid) -> StoreResult<Vec<CommentView>>;
    async fn comment_anchor(&self, id: Uuid) -> StoreResult<Option<CommentAnchor>>;
    async fn create_comment(
        &self,
        author_id: Uuid,
        target: TargetKind,
        target_id: Uuid,
        input: &CommentInput,
    ) -> StoreResult<CommentView>;
    /// Adds the like if absent, removes it otherwise.
    async fn toggle_like(
        &self,
        member_id: Uuid,
        target: TargetKind,
        target_id: Uuid,
    ) -> StoreResult<LikeState>;
    async fn like_count(&self, target: TargetKind, target_id: Uuid) -> StoreResult<i64>;

    // Activity log

    async fn record_activity(
        &self,
        member_id: Option<Uuid>,
        action: &str,
        details: Option<&str>,
    ) -> StoreResult<()>;
    async fn recent_activity(&self, limit: i64) -> StoreResult<Vec<ActivityEntry>>;
}

/// Opens the configured backend and applies pending migrations.
pub async fn connect(config: &Config) -> Result<Arc<dyn Store>, sqlx::Error> {
    let backend = config.backend().ok_or_else(|| {
        sqlx::Error::Configuration(
            format!(
                "cannot infer database backend from '{}'; set DATABASE_BACKEND",
                config.redacted_database_url()
            )
            .into(),
        )
    })?;

    tracing::info!(%backend, "Connecting to database");

    let store: Arc<dyn Store> = match backend {
        Backend::Postgres => Arc::new(PgStore::connect(config).await?),
        Backend::Sqlite => Arc::new(SqliteStore::connect(config).await?),
    };

    Ok(store)
}
