use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::blog::CommentView;
use crate::models::member::non_empty;

pub const DEFAULT_MAX_ATTENDEES: i32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub max_attendees: i32,
    pub created_by: Uuid,
    pub place_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.event_date >= today
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub place_id: Uuid,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub max_attendees: Option<i32>,
}

impl EventInput {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            place_id: self.place_id,
            event_date: self.event_date,
            event_time: non_empty(self.event_time),
            max_attendees: self.max_attendees,
        }
    }

    /// Capacity to store; missing or non-positive values fall back to the default.
    pub fn capacity(&self) -> i32 {
        match self.max_attendees {
            Some(n) if n >= 1 => n,
            _ => DEFAULT_MAX_ATTENDEES,
        }
    }

    pub fn parsed_time(&self) -> Result<Option<NaiveTime>, chrono::ParseError> {
        self.event_time.as_deref().map(parse_event_time).transpose()
    }
}

/// Accepts `HH:MM` as sent by time pickers as well as `HH:MM:SS`.
pub fn parse_event_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
}

/// Fully resolved event ready for insertion.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub max_attendees: i32,
    pub created_by: Uuid,
    pub place_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFilter {
    Upcoming,
    Past,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub filter: Option<EventFilter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub events: Vec<Event>,
    pub upcoming_count: usize,
    pub past_count: usize,
}

impl EventListing {
    pub fn new(events: Vec<Event>, today: NaiveDate) -> Self {
        let upcoming_count = events.iter().filter(|e| e.is_upcoming(today)).count();
        let past_count = events.len() - upcoming_count;
        Self {
            events,
            upcoming_count,
            past_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub attendee_count: i64,
    pub creator_name: String,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub attendees: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RsvpInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "one")]
    #[validate(range(min = 1, message = "At least one attendee is required"))]
    pub attendees: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RsvpInput {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_empty(self.phone),
            attendees: self.attendees,
            notes: non_empty(self.notes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(max_attendees: Option<i32>) -> EventInput {
        EventInput {
            title: "Sunday cruise".to_string(),
            description: "Coastal run".to_string(),
            place_id: Uuid::new_v4(),
            event_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            event_time: Some("18:30".to_string()),
            max_attendees,
        }
    }

    #[test]
    fn test_capacity_defaults_to_fifty() {
        assert_eq!(input(None).capacity(), 50);
        assert_eq!(input(Some(0)).capacity(), 50);
        assert_eq!(input(Some(-3)).capacity(), 50);
        assert_eq!(input(Some(12)).capacity(), 12);
    }

    #[test]
    fn test_event_time_accepts_short_and_long_forms() {
        assert_eq!(
            parse_event_time("18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert_eq!(
            parse_event_time("07:05:09").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 9).unwrap()
        );
        assert!(parse_event_time("half past six").is_err());
    }

    #[test]
    fn test_listing_counts_today_as_upcoming() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let make = |date: NaiveDate| Event {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: "d".to_string(),
            location: "l".to_string(),
            event_date: date,
            event_time: None,
            max_attendees: 50,
            created_by: Uuid::new_v4(),
            place_id: None,
            created_at: Utc::now(),
        };
        let listing = EventListing::new(
            vec![
                make(today),
                make(today.pred_opt().unwrap()),
                make(today.succ_opt().unwrap()),
            ],
            today,
        );
        assert_eq!(listing.upcoming_count, 2);
        assert_eq!(listing.past_count, 1);
    }

    #[test]
    fn test_rsvp_attendees_default_to_one() {
        let rsvp: RsvpInput =
            serde_json::from_str(r#"{"name":"Sam","email":"sam@example.com"}"#).unwrap();
        assert_eq!(rsvp.attendees, 1);
    }
}
