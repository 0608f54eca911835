use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::models::blog::TargetKind;
use crate::models::event::{
    Event, EventDetail, EventInput, EventListing, EventQuery, NewEvent, Rsvp, RsvpInput,
};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

const UNKNOWN_CREATOR: &str = "Unknown";

pub async fn list(store: &dyn Store, query: EventQuery, today: NaiveDate) -> AppResult<EventListing> {
    let events = store
        .list_events(query.search.as_deref(), query.filter, today)
        .await?;
    Ok(EventListing::new(events, today))
}

async fn find(store: &dyn Store, id: Uuid) -> AppResult<Event> {
    store
        .event_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

pub async fn detail(store: &dyn Store, id: Uuid) -> AppResult<EventDetail> {
    let event = find(store, id).await?;
    let attendee_count = store.attendee_count(event.id).await?;
    let creator_name = store
        .member_by_id(event.created_by)
        .await?
        .map(|member| member.full_name())
        .unwrap_or_else(|| UNKNOWN_CREATOR.to_string());
    let comments = store.comments(TargetKind::Event, event.id).await?;

    Ok(EventDetail {
        event,
        attendee_count,
        creator_name,
        comments,
    })
}

/// Creates an event at an existing place; the place fixes the location text.
pub async fn create(store: &dyn Store, creator: Uuid, input: EventInput) -> AppResult<Event> {
    let input = input.normalized();
    input.validate()?;

    let event_time = input
        .parsed_time()
        .map_err(|_| AppError::ValidationError("Event time must be HH:MM".to_string()))?;

    let place = store
        .place_by_id(input.place_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Selected place not found".to_string()))?;

    let event = store
        .create_event(&NewEvent {
            max_attendees: input.capacity(),
            title: input.title,
            description: input.description,
            location: place.event_location(),
            event_date: input.event_date,
            event_time,
            created_by: creator,
            place_id: Some(place.id),
        })
        .await?;

    tracing::info!(event = %event.id, title = %event.title, "Event created");
    Ok(event)
}

/// Records an RSVP for an upcoming event, refusing once capacity is reached.
pub async fn rsvp(
    store: &dyn Store,
    event_id: Uuid,
    input: RsvpInput,
    today: NaiveDate,
) -> AppResult<Rsvp> {
    let input = input.normalized();
    input.validate()?;

    let event = store
        .event_by_id(event_id)
        .await?
        .filter(|event| event.is_upcoming(today))
        .ok_or_else(|| AppError::NotFound("Event not found or has already passed".to_string()))?;

    let taken = store.attendee_count(event.id).await?;
    if taken + i64::from(input.attendees) > i64::from(event.max_attendees) {
        return Err(AppError::ValidationError("Event is at capacity".to_string()));
    }

    let rsvp = store.create_rsvp(event.id, &input).await?;
    tracing::info!(event = %event.id, attendees = rsvp.attendees, "RSVP recorded");
    Ok(rsvp)
}

pub async fn rsvps(store: &dyn Store, event_id: Uuid) -> AppResult<Vec<Rsvp>> {
    let event = find(store, event_id).await?;
    Ok(store.list_rsvps(event.id).await?)
}
