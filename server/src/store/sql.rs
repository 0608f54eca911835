//! SQL shared by the Postgres and SQLite stores.
//!
//! Both backends accept `$N` placeholders and the dialect subset used here, so
//! the [`Store`](super::Store) implementation is written once and stamped
//! onto each pool-holding struct by [`sql_store!`]. The struct must expose a
//! `pool` field and a `MIGRATOR` static must be in scope at the call site.

/// `%term%`, lower-cased, for case-insensitive `LIKE` against `LOWER(col)`.
/// Blank terms mean "no filter".
pub(crate) fn like_pattern(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", t.to_lowercase()))
}

pub(crate) fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

macro_rules! sql_store {
    ($store:ty) => {
        const _: () = {
            use async_trait::async_trait;
            use chrono::{DateTime, NaiveDate, Utc};
            use uuid::Uuid;

            use $crate::models::activity::ActivityEntry;
            use $crate::models::blog::{
                Author, BlogPost, BlogPostInput, CommentAnchor, CommentInput, CommentView, LikeState,
                PostHeadline, TargetKind,
            };
            use $crate::models::event::{Event, EventFilter, NewEvent, Rsvp, RsvpInput};
            use $crate::models::member::{
                Member, MemberSort, MemberUpdate, NewMember, ProfileUpdate,
            };
            use $crate::models::permission::{Capabilities, MemberCapabilities};
            use $crate::models::place::{Place, PlaceInput};
            use $crate::models::ticket::{NewTicket, TicketId, TicketStatus, TicketWithEvent};
            use $crate::models::vehicle::{Vehicle, VehicleInput, VehicleListing, VehicleQuery};
            use $crate::store::sql::{blank_to_none, like_pattern};
            use $crate::store::{StatusGroup, Store, StoreResult};

            const MEMBER_COLUMNS: &str = "id, username, password_hash, email, first_name, \
                last_name, phone, bio, profile_picture, location, joined_at, updated_at";

            const EVENT_COLUMNS: &str = "id, title, description, location, event_date, \
                event_time, max_attendees, created_by, place_id, created_at";

            const VEHICLE_LISTING: &str = "SELECT v.id, v.member_id, v.make, v.model, v.year, \
                v.color, v.license_plate, v.description, v.created_at, \
                m.first_name AS owner_first_name, m.last_name AS owner_last_name \
                FROM vehicles v JOIN members m ON m.id = v.member_id";

            const TICKET_WITH_EVENT: &str = "SELECT t.id, t.event_id, t.member_id, \
                t.buyer_name, t.buyer_email, t.buyer_phone, t.price_cents, t.status, \
                t.purchased_at, t.scanned_at, t.scanned_by, \
                e.title AS event_title, e.event_date, e.location AS event_location \
                FROM tickets t JOIN events e ON e.id = t.event_id";

            const POST_COLUMNS: &str = "id, title, content, author_id, category, tags, \
                featured, published, created_at, updated_at";

            const COMMENT_VIEW: &str = "SELECT c.id, c.content, c.author_id, c.parent_id, \
                c.created_at, m.first_name AS author_first_name, \
                m.last_name AS author_last_name \
                FROM comments c JOIN members m ON m.id = c.author_id";

            #[async_trait]
            impl Store for $store {
                async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
                    MIGRATOR.run(&self.pool).await
                }

                async fn create_member(&self, member: &NewMember) -> StoreResult<Member> {
                    let now = Utc::now();
                    let mut tx = self.pool.begin().await?;

                    let created = sqlx::query_as::<_, Member>(&format!(
                        "INSERT INTO members (id, username, password_hash, email, first_name, \
                         last_name, joined_at, updated_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {MEMBER_COLUMNS}"
                    ))
                    .bind(Uuid::new_v4())
                    .bind(&member.username)
                    .bind(&member.password_hash)
                    .bind(&member.email)
                    .bind(&member.first_name)
                    .bind(&member.last_name)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await?;

                    sqlx::query(
                        "INSERT INTO permissions (member_id, can_edit_members, \
                         can_post_events, can_manage_vehicles) VALUES ($1, FALSE, FALSE, FALSE)",
                    )
                    .bind(created.id)
                    .execute(&mut *tx)
                    .await?;

                    tx.commit().await?;
                    Ok(created)
                }

                async fn member_by_id(&self, id: Uuid) -> StoreResult<Option<Member>> {
                    sqlx::query_as::<_, Member>(&format!(
                        "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
                    ))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn member_by_username(&self, username: &str) -> StoreResult<Option<Member>> {
                    sqlx::query_as::<_, Member>(&format!(
                        "SELECT {MEMBER_COLUMNS} FROM members WHERE username = $1"
                    ))
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
                    sqlx::query_as::<_, Member>(&format!(
                        "SELECT {MEMBER_COLUMNS} FROM members WHERE LOWER(email) = LOWER($1)"
                    ))
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn list_members(
                    &self,
                    search: Option<&str>,
                    sort: MemberSort,
                ) -> StoreResult<Vec<Member>> {
                    let order = match sort {
                        MemberSort::Username => "username ASC",
                        MemberSort::JoinDate => "joined_at DESC",
                    };
                    sqlx::query_as::<_, Member>(&format!(
                        "SELECT {MEMBER_COLUMNS} FROM members \
                         WHERE ($1 IS NULL OR LOWER(username) LIKE $1 \
                            OR LOWER(first_name) LIKE $1 OR LOWER(last_name) LIKE $1) \
                         ORDER BY {order}"
                    ))
                    .bind(like_pattern(search))
                    .fetch_all(&self.pool)
                    .await
                }

                async fn update_member(
                    &self,
                    id: Uuid,
                    update: &MemberUpdate,
                ) -> StoreResult<Option<Member>> {
                    let profile = &update.profile;
                    sqlx::query_as::<_, Member>(&format!(
                        "UPDATE members SET username = $2, email = $3, first_name = $4, \
                         last_name = $5, phone = $6, bio = $7, profile_picture = $8, \
                         location = $9, updated_at = $10 \
                         WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
                    ))
                    .bind(id)
                    .bind(&update.username)
                    .bind(&profile.email)
                    .bind(&profile.first_name)
                    .bind(&profile.last_name)
                    .bind(&profile.phone)
                    .bind(&profile.bio)
                    .bind(&profile.profile_picture)
                    .bind(&profile.location)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn update_profile(
                    &self,
                    id: Uuid,
                    profile: &ProfileUpdate,
                ) -> StoreResult<Option<Member>> {
                    sqlx::query_as::<_, Member>(&format!(
                        "UPDATE members SET email = $2, first_name = $3, last_name = $4, \
                         phone = $5, bio = $6, profile_picture = $7, location = $8, \
                         updated_at = $9 WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
                    ))
                    .bind(id)
                    .bind(&profile.email)
                    .bind(&profile.first_name)
                    .bind(&profile.last_name)
                    .bind(&profile.phone)
                    .bind(&profile.bio)
                    .bind(&profile.profile_picture)
                    .bind(&profile.location)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
                    let result = sqlx::query(
                        "UPDATE members SET password_hash = $2, updated_at = $3 WHERE id = $1",
                    )
                    .bind(id)
                    .bind(password_hash)
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await?;
                    Ok(result.rows_affected() == 1)
                }

                async fn count_members(&self) -> StoreResult<i64> {
                    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
                        .fetch_one(&self.pool)
                        .await
                }

                async fn capabilities(&self, member_id: Uuid) -> StoreResult<Option<Capabilities>> {
                    sqlx::query_as::<_, Capabilities>(
                        "SELECT can_edit_members, can_post_events, can_manage_vehicles \
                         FROM permissions WHERE member_id = $1",
                    )
                    .bind(member_id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn set_capabilities(&self, member_id: Uuid, caps: Capabilities) -> StoreResult<()> {
                    sqlx::query(
                        "INSERT INTO permissions (member_id, can_edit_members, can_post_events, \
                         can_manage_vehicles) VALUES ($1, $2, $3, $4) \
                         ON CONFLICT (member_id) DO UPDATE SET \
                         can_edit_members = excluded.can_edit_members, \
                         can_post_events = excluded.can_post_events, \
                         can_manage_vehicles = excluded.can_manage_vehicles",
                    )
                    .bind(member_id)
                    .bind(caps.can_edit_members)
                    .bind(caps.can_post_events)
                    .bind(caps.can_manage_vehicles)
                    .execute(&self.pool)
                    .await?;
                    Ok(())
                }

                async fn list_member_capabilities(&self) -> StoreResult<Vec<MemberCapabilities>> {
                    sqlx::query_as::<_, MemberCapabilities>(
                        "SELECT m.id AS member_id, m.username, m.first_name, m.last_name, m.email, \
                         COALESCE(p.can_edit_members, FALSE) AS can_edit_members, \
                         COALESCE(p.can_post_events, FALSE) AS can_post_events, \
                         COALESCE(p.can_manage_vehicles, FALSE) AS can_manage_vehicles \
                         FROM members m LEFT JOIN permissions p ON p.member_id = m.id \
                         ORDER BY m.username",
                    )
                    .fetch_all(&self.pool)
                    .await
                }

                async fn list_vehicles(&self, query: &VehicleQuery) -> StoreResult<Vec<VehicleListing>> {
                    sqlx::query_as::<_, VehicleListing>(&format!(
                        "{VEHICLE_LISTING} \
                         WHERE ($1 IS NULL OR LOWER(v.make) LIKE $1 OR LOWER(v.model) LIKE $1 \
                            OR LOWER(m.first_name) LIKE $1 OR LOWER(m.last_name) LIKE $1) \
                           AND ($2 IS NULL OR v.make = $2) \
                         ORDER BY v.created_at DESC"
                    ))
                    .bind(like_pattern(query.search.as_deref()))
                    .bind(blank_to_none(query.make.as_deref()))
                    .fetch_all(&self.pool)
                    .await
                }

                async fn vehicle_by_id(&self, id: Uuid) -> StoreResult<Option<VehicleListing>> {
                    sqlx::query_as::<_, VehicleListing>(&format!("{VEHICLE_LISTING} WHERE v.id = $1"))
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await
                }

                async fn create_vehicle(&self, owner: Uuid, input: &VehicleInput) -> StoreResult<Vehicle> {
                    sqlx::query_as::<_, Vehicle>(
                        "INSERT INTO vehicles (id, member_id, make, model, year, color, \
                         license_plate, description, created_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                         RETURNING id, member_id, make, model, year, color, license_plate, \
                         description, created_at",
                    )
                    .bind(Uuid::new_v4())
                    .bind(owner)
                    .bind(&input.make)
                    .bind(&input.model)
                    .bind(input.year)
                    .bind(&input.color)
                    .bind(&input.license_plate)
                    .bind(&input.description)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await
                }

                async fn update_vehicle(
                    &self,
                    id: Uuid,
                    input: &VehicleInput,
                ) -> StoreResult<Option<Vehicle>> {
                    sqlx::query_as::<_, Vehicle>(
                        "UPDATE vehicles SET make = $2, model = $3, year = $4, color = $5, \
                         license_plate = $6, description = $7 WHERE id = $1 \
                         RETURNING id, member_id, make, model, year, color, license_plate, \
                         description, created_at",
                    )
                    .bind(id)
                    .bind(&input.make)
                    .bind(&input.model)
                    .bind(input.year)
                    .bind(&input.color)
                    .bind(&input.license_plate)
                    .bind(&input.description)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn count_vehicles(&self) -> StoreResult<i64> {
                    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vehicles")
                        .fetch_one(&self.pool)
                        .await
                }

                async fn list_places(&self, limit: Option<i64>) -> StoreResult<Vec<Place>> {
                    sqlx::query_as::<_, Place>(
                        "SELECT id, name, address, place_type, description, latitude, longitude, \
                         added_by, created_at FROM places ORDER BY name LIMIT $1",
                    )
                    .bind(limit.unwrap_or(i64::MAX))
                    .fetch_all(&self.pool)
                    .await
                }

                async fn place_by_id(&self, id: Uuid) -> StoreResult<Option<Place>> {
                    sqlx::query_as::<_, Place>(
                        "SELECT id, name, address, place_type, description, latitude, longitude, \
                         added_by, created_at FROM places WHERE id = $1",
                    )
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn create_place(&self, added_by: Uuid, input: &PlaceInput) -> StoreResult<Place> {
                    sqlx::query_as::<_, Place>(
                        "INSERT INTO places (id, name, address, place_type, description, \
                         latitude, longitude, added_by, created_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                         RETURNING id, name, address, place_type, description, latitude, \
                         longitude, added_by, created_at",
                    )
                    .bind(Uuid::new_v4())
                    .bind(&input.name)
                    .bind(&input.address)
                    .bind(&input.place_type)
                    .bind(&input.description)
                    .bind(input.latitude)
                    .bind(input.longitude)
                    .bind(added_by)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await
                }

                async fn list_events(
                    &self,
                    search: Option<&str>,
                    filter: Option<EventFilter>,
                    today: NaiveDate,
                ) -> StoreResult<Vec<Event>> {
                    let (from, before) = match filter {
                        Some(EventFilter::Upcoming) => (Some(today), None),
                        Some(EventFilter::Past) => (None, Some(today)),
                        None => (None, None),
                    };
                    sqlx::query_as::<_, Event>(&format!(
                        "SELECT {EVENT_COLUMNS} FROM events \
                         WHERE ($1 IS NULL OR LOWER(title) LIKE $1 \
                            OR LOWER(description) LIKE $1 OR LOWER(location) LIKE $1) \
                           AND ($2 IS NULL OR event_date >= $2) \
                           AND ($3 IS NULL OR event_date < $3) \
                         ORDER BY event_date DESC, created_at DESC"
                    ))
                    .bind(like_pattern(search))
                    .bind(from)
                    .bind(before)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn latest_events(&self, limit: i64) -> StoreResult<Vec<Event>> {
                    sqlx::query_as::<_, Event>(&format!(
                        "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC LIMIT $1"
                    ))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn upcoming_events(&self, today: NaiveDate) -> StoreResult<Vec<Event>> {
                    sqlx::query_as::<_, Event>(&format!(
                        "SELECT {EVENT_COLUMNS} FROM events WHERE event_date >= $1 \
                         ORDER BY event_date ASC, created_at ASC"
                    ))
                    .bind(today)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn count_upcoming_events(&self, today: NaiveDate) -> StoreResult<i64> {
                    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE event_date >= $1")
                        .bind(today)
                        .fetch_one(&self.pool)
                        .await
                }

                async fn event_by_id(&self, id: Uuid) -> StoreResult<Option<Event>> {
                    sqlx::query_as::<_, Event>(&format!(
                        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
                    ))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn create_event(&self, event: &NewEvent) -> StoreResult<Event> {
                    sqlx::query_as::<_, Event>(&format!(
                        "INSERT INTO events (id, title, description, location, event_date, \
                         event_time, max_attendees, created_by, place_id, created_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                         RETURNING {EVENT_COLUMNS}"
                    ))
                    .bind(Uuid::new_v4())
                    .bind(&event.title)
                    .bind(&event.description)
                    .bind(&event.location)
                    .bind(event.event_date)
                    .bind(event.event_time)
                    .bind(event.max_attendees)
                    .bind(event.created_by)
                    .bind(event.place_id)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await
                }

                async fn attendee_count(&self, event_id: Uuid) -> StoreResult<i64> {
                    sqlx::query_scalar::<_, i64>(
                        "SELECT CAST(COALESCE(SUM(attendees), 0) AS BIGINT) \
                         FROM event_rsvps WHERE event_id = $1",
                    )
                    .bind(event_id)
                    .fetch_one(&self.pool)
                    .await
                }

                async fn create_rsvp(&self, event_id: Uuid, input: &RsvpInput) -> StoreResult<Rsvp> {
                    sqlx::query_as::<_, Rsvp>(
                        "INSERT INTO event_rsvps (id, event_id, email, name, phone, attendees, \
                         notes, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                         RETURNING id, event_id, email, name, phone, attendees, notes, created_at",
                    )
                    .bind(Uuid::new_v4())
                    .bind(event_id)
                    .bind(&input.email)
                    .bind(&input.name)
                    .bind(&input.phone)
                    .bind(input.attendees)
                    .bind(&input.notes)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await
                }

                async fn list_rsvps(&self, event_id: Uuid) -> StoreResult<Vec<Rsvp>> {
                    sqlx::query_as::<_, Rsvp>(
                        "SELECT id, event_id, email, name, phone, attendees, notes, created_at \
                         FROM event_rsvps WHERE event_id = $1 ORDER BY created_at ASC",
                    )
                    .bind(event_id)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn insert_ticket(&self, ticket: &NewTicket) -> StoreResult<()> {
                    sqlx::query(
                        "INSERT INTO tickets (id, event_id, member_id, buyer_name, buyer_email, \
                         buyer_phone, price_cents, status, purchased_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, 'valid', $8)",
                    )
                    .bind(&ticket.id)
                    .bind(ticket.event_id)
                    .bind(ticket.member_id)
                    .bind(&ticket.buyer_name)
                    .bind(&ticket.buyer_email)
                    .bind(&ticket.buyer_phone)
                    .bind(ticket.price_cents)
                    .bind(ticket.purchased_at)
                    .execute(&self.pool)
                    .await?;
                    Ok(())
                }

                async fn ticket_with_event(&self, id: &TicketId) -> StoreResult<Option<TicketWithEvent>> {
                    sqlx::query_as::<_, TicketWithEvent>(&format!(
                        "{TICKET_WITH_EVENT} WHERE t.id = $1"
                    ))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn mark_ticket_used(
                    &self,
                    id: &TicketId,
                    scanned_at: DateTime<Utc>,
                    scanned_by: &str,
                ) -> StoreResult<bool> {
                    let result = sqlx::query(
                        "UPDATE tickets SET status = 'used', scanned_at = $2, scanned_by = $3 \
                         WHERE id = $1 AND status = 'valid'",
                    )
                    .bind(id)
                    .bind(scanned_at)
                    .bind(scanned_by)
                    .execute(&self.pool)
                    .await?;
                    Ok(result.rows_affected() == 1)
                }

                async fn expire_ticket(&self, id: &TicketId, from: TicketStatus) -> StoreResult<bool> {
                    let result = sqlx::query(
                        "UPDATE tickets SET status = 'expired' WHERE id = $1 AND status = $2",
                    )
                    .bind(id)
                    .bind(from.as_str())
                    .execute(&self.pool)
                    .await?;
                    Ok(result.rows_affected() == 1)
                }

                async fn expire_tickets_before(&self, today: NaiveDate) -> StoreResult<u64> {
                    let result = sqlx::query(
                        "UPDATE tickets SET status = 'expired' WHERE status = 'valid' \
                         AND event_id IN (SELECT id FROM events WHERE event_date < $1)",
                    )
                    .bind(today)
                    .execute(&self.pool)
                    .await?;
                    Ok(result.rows_affected())
                }

                async fn ticket_status_groups(&self) -> StoreResult<Vec<StatusGroup>> {
                    let rows = sqlx::query_as::<_, (String, i64, i64)>(
                        "SELECT status, COUNT(*), CAST(COALESCE(SUM(price_cents), 0) AS BIGINT) \
                         FROM tickets GROUP BY status",
                    )
                    .fetch_all(&self.pool)
                    .await?;

                    rows.into_iter()
                        .map(|(status, count, cents)| {
                            let status = status
                                .parse::<TicketStatus>()
                                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                            Ok((status, count, cents))
                        })
                        .collect()
                }

                async fn recent_tickets(&self, limit: i64) -> StoreResult<Vec<TicketWithEvent>> {
                    sqlx::query_as::<_, TicketWithEvent>(&format!(
                        "{TICKET_WITH_EVENT} ORDER BY t.purchased_at DESC LIMIT $1"
                    ))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn list_posts(
                    &self,
                    category: Option<&str>,
                    featured_only: bool,
                    limit: i64,
                    offset: i64,
                ) -> StoreResult<Vec<BlogPost>> {
                    sqlx::query_as::<_, BlogPost>(&format!(
                        "SELECT {POST_COLUMNS} FROM blog_posts \
                         WHERE published = TRUE AND ($1 IS NULL OR category = $1) \
                           AND ($2 = FALSE OR featured = TRUE) \
                         ORDER BY created_at DESC LIMIT $3 OFFSET $4"
                    ))
                    .bind(category)
                    .bind(featured_only)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn count_posts(&self, category: Option<&str>, featured_only: bool) -> StoreResult<i64> {
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*) FROM blog_posts \
                         WHERE published = TRUE AND ($1 IS NULL OR category = $1) \
                           AND ($2 = FALSE OR featured = TRUE)",
                    )
                    .bind(category)
                    .bind(featured_only)
                    .fetch_one(&self.pool)
                    .await
                }

                async fn post_categories(&self) -> StoreResult<Vec<String>> {
                    sqlx::query_scalar::<_, String>(
                        "SELECT DISTINCT category FROM blog_posts \
                         WHERE published = TRUE AND category IS NOT NULL ORDER BY category",
                    )
                    .fetch_all(&self.pool)
                    .await
                }

                async fn featured_headlines(&self, limit: i64) -> StoreResult<Vec<PostHeadline>> {
                    sqlx::query_as::<_, PostHeadline>(
                        "SELECT id, title, created_at FROM blog_posts \
                         WHERE published = TRUE AND featured = TRUE \
                         ORDER BY created_at DESC LIMIT $1",
                    )
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn related_headlines(
                    &self,
                    post: &BlogPost,
                    limit: i64,
                ) -> StoreResult<Vec<PostHeadline>> {
                    let Some(category) = post.category.as_deref() else {
                        return Ok(Vec::new());
                    };
                    sqlx::query_as::<_, PostHeadline>(
                        "SELECT id, title, created_at FROM blog_posts \
                         WHERE published = TRUE AND category = $1 AND id <> $2 \
                         ORDER BY created_at DESC LIMIT $3",
                    )
                    .bind(category)
                    .bind(post.id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn post_by_id(&self, id: Uuid) -> StoreResult<Option<BlogPost>> {
                    sqlx::query_as::<_, BlogPost>(&format!(
                        "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"
                    ))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn author(&self, member_id: Uuid) -> StoreResult<Option<Author>> {
                    sqlx::query_as::<_, Author>(
                        "SELECT first_name, last_name, bio, profile_picture FROM members WHERE id = $1",
                    )
                    .bind(member_id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn create_post(&self, author_id: Uuid, input: &BlogPostInput) -> StoreResult<BlogPost> {
                    sqlx::query_as::<_, BlogPost>(&format!(
                        "INSERT INTO blog_posts (id, title, content, author_id, category, tags, \
                         featured, published, created_at, updated_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
                         RETURNING {POST_COLUMNS}"
                    ))
                    .bind(Uuid::new_v4())
                    .bind(&input.title)
                    .bind(&input.content)
                    .bind(author_id)
                    .bind(&input.category)
                    .bind(&input.tags)
                    .bind(input.featured)
                    .bind(input.published)
                    .bind(Utc::now())
                    .fetch_one(&self.pool)
                    .await
                }

                async fn comments(&self, target: TargetKind, target_id: Uuid) -> StoreResult<Vec<CommentView>> {
                    sqlx::query_as::<_, CommentView>(&format!(
                        "{COMMENT_VIEW} WHERE c.target_type = $1 AND c.target_id = $2 \
                         ORDER BY c.created_at ASC"
                    ))
                    .bind(target.as_str())
                    .bind(target_id)
                    .fetch_all(&self.pool)
                    .await
                }

                async fn comment_anchor(&self, id: Uuid) -> StoreResult<Option<CommentAnchor>> {
                    sqlx::query_as::<_, CommentAnchor>(
                        "SELECT target_type, target_id FROM comments WHERE id = $1",
                    )
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                }

                async fn create_comment(
                    &self,
                    author_id: Uuid,
                    target: TargetKind,
                    target_id: Uuid,
                    input: &CommentInput,
                ) -> StoreResult<CommentView> {
                    let id = Uuid::new_v4();
                    let mut tx = self.pool.begin().await?;

                    sqlx::query(
                        "INSERT INTO comments (id, content, author_id, target_type, target_id, \
                         parent_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    )
                    .bind(id)
                    .bind(&input.content)
                    .bind(author_id)
                    .bind(target.as_str())
                    .bind(target_id)
                    .bind(input.parent_id)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?;

                    let view = sqlx::query_as::<_, CommentView>(&format!("{COMMENT_VIEW} WHERE c.id = $1"))
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;

                    tx.commit().await?;
                    Ok(view)
                }

                async fn toggle_like(
                    &self,
                    member_id: Uuid,
                    target: TargetKind,
                    target_id: Uuid,
                ) -> StoreResult<LikeState> {
                    let mut tx = self.pool.begin().await?;

                    let removed = sqlx::query(
                        "DELETE FROM likes WHERE member_id = $1 AND target_type = $2 AND target_id = $3",
                    )
                    .bind(member_id)
                    .bind(target.as_str())
                    .bind(target_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                    if removed == 0 {
                        sqlx::query(
                            "INSERT INTO likes (member_id, target_type, target_id, created_at) \
                             VALUES ($1, $2, $3, $4)",
                        )
                        .bind(member_id)
                        .bind(target.as_str())
                        .bind(target_id)
                        .bind(Utc::now())
                        .execute(&mut *tx)
                        .await?;
                    }

                    let like_count = sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*) FROM likes WHERE target_type = $1 AND target_id = $2",
                    )
                    .bind(target.as_str())
                    .bind(target_id)
                    .fetch_one(&mut *tx)
                    .await?;

                    tx.commit().await?;
                    Ok(LikeState {
                        liked: removed == 0,
                        like_count,
                    })
                }

                async fn like_count(&self, target: TargetKind, target_id: Uuid) -> StoreResult<i64> {
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*) FROM likes WHERE target_type = $1 AND target_id = $2",
                    )
                    .bind(target.as_str())
                    .bind(target_id)
                    .fetch_one(&self.pool)
                    .await
                }

                async fn record_activity(
                    &self,
                    member_id: Option<Uuid>,
                    action: &str,
                    details: Option<&str>,
                ) -> StoreResult<()> {
                    sqlx::query(
                        "INSERT INTO activity_log (id, member_id, action, details, created_at) \
                         VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(Uuid::new_v4())
                    .bind(member_id)
                    .bind(action)
                    .bind(details)
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await?;
                    Ok(())
                }

                async fn recent_activity(&self, limit: i64) -> StoreResult<Vec<ActivityEntry>> {
                    sqlx::query_as::<_, ActivityEntry>(
                        "SELECT id, member_id, action, details, created_at FROM activity_log \
                         ORDER BY created_at DESC LIMIT $1",
                    )
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                }
            }
        };
    };
}

pub(crate) use sql_store;
