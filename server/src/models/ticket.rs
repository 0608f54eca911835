use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::models::member::non_empty;

/// Random bytes behind a ticket id; rendered as twice as many hex digits.
pub const TICKET_ID_BYTES: usize = 8;
pub const TICKET_ID_LEN: usize = TICKET_ID_BYTES * 2;
/// Prefix carried inside the QR payload. Scanners may send it back verbatim.
pub const QR_PREFIX: &str = "TICKET:";

pub const DEFAULT_BUYER_NAME: &str = "Guest";
pub const DEFAULT_BUYER_EMAIL: &str = "guest@example.com";
pub const DEFAULT_PRICE_CENTS: i64 = 1000;

/// Opaque ticket identifier: upper-case hex, fixed length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TICKET_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode_upper(bytes))
    }

    /// Parses what a scanner or URL hands us: optional `TICKET:` prefix,
    /// surrounding whitespace and lower-case hex are all accepted.
    pub fn parse(raw: &str) -> Result<Self, TicketRejection> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix(QR_PREFIX).unwrap_or(trimmed).trim();
        if bare.len() != TICKET_ID_LEN || !bare.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TicketRejection::InvalidId);
        }
        Ok(Self(bare.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text encoded into the ticket's QR code.
    pub fn qr_payload(&self) -> String {
        format!("{QR_PREFIX}{}", self.0)
    }

    pub fn qr_code_url(&self) -> String {
        format!("/api/tickets/{}/qr", self.0)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Valid,
    Used,
    Expired,
}

/// Why a ticket in a given status cannot be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    AlreadyUsed,
    Expired,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [TicketStatus::Valid, TicketStatus::Used, TicketStatus::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Valid => "valid",
            TicketStatus::Used => "used",
            TicketStatus::Expired => "expired",
        }
    }

    /// Status after a successful scan.
    pub fn scan(self) -> Result<TicketStatus, Refusal> {
        match self {
            TicketStatus::Valid => Ok(TicketStatus::Used),
            TicketStatus::Used => Err(Refusal::AlreadyUsed),
            TicketStatus::Expired => Err(Refusal::Expired),
        }
    }

    /// Status after expiring, or `None` when the ticket is already expired.
    pub fn expire(self) -> Option<TicketStatus> {
        match self {
            TicketStatus::Valid | TicketStatus::Used => Some(TicketStatus::Expired),
            TicketStatus::Expired => None,
        }
    }

    pub fn counts_as_revenue(self) -> bool {
        matches!(self, TicketStatus::Valid | TicketStatus::Used)
    }
}

#[derive(Debug, Error)]
#[error("unknown ticket status `{0}`")]
pub struct UnknownStatus(String);

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(TicketStatus::Valid),
            "used" => Ok(TicketStatus::Used),
            "expired" => Ok(TicketStatus::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Converts a user-supplied price to whole cents, rounding half away from zero.
pub fn price_to_cents(price: Decimal) -> Option<i64> {
    if price.is_sign_negative() {
        return None;
    }
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED).to_i64()
}

fn serialize_cents<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    Serialize::serialize(&cents_to_price(*cents), serializer)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    pub id: TicketId,
    pub event_id: Uuid,
    pub member_id: Option<Uuid>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    #[serde(rename = "price", serialize_with = "serialize_cents")]
    pub price_cents: i64,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    pub purchased_at: DateTime<Utc>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub scanned_by: Option<String>,
}

/// A ticket together with the event it admits to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketWithEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: Ticket,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_location: String,
}

impl TicketWithEvent {
    pub fn summary(&self) -> TicketSummary {
        TicketSummary {
            id: self.ticket.id.clone(),
            buyer_name: self.ticket.buyer_name.clone(),
            event_name: self.event_title.clone(),
            event_date: self.event_date,
            status: self.ticket.status,
            scanned_at: self.ticket.scanned_at,
        }
    }
}

/// Ticket metadata echoed back to scanners, on success and on rejection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub buyer_name: String,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub status: TicketStatus,
    pub scanned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: TicketWithEvent,
    pub qr_code_url: String,
}

impl From<TicketWithEvent> for TicketView {
    fn from(ticket: TicketWithEvent) -> Self {
        let qr_code_url = ticket.ticket.id.qr_code_url();
        Self {
            ticket,
            qr_code_url,
        }
    }
}

/// Everything that can go wrong when resolving or admitting a ticket.
#[derive(Debug, Clone, Error)]
pub enum TicketRejection {
    #[error("Invalid ticket ID")]
    InvalidId,

    #[error("Ticket not found")]
    NotFound(TicketId),

    #[error("Ticket has already been used")]
    AlreadyUsed(TicketSummary),

    #[error("Ticket has expired")]
    Expired(TicketSummary),
}

impl TicketRejection {
    pub fn refused(refusal: Refusal, summary: TicketSummary) -> Self {
        match refusal {
            Refusal::AlreadyUsed => TicketRejection::AlreadyUsed(summary),
            Refusal::Expired => TicketRejection::Expired(summary),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TicketRejection::InvalidId => StatusCode::BAD_REQUEST,
            TicketRejection::NotFound(_) => StatusCode::NOT_FOUND,
            TicketRejection::AlreadyUsed(_) | TicketRejection::Expired(_) => StatusCode::CONFLICT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TicketRejection::InvalidId => "INVALID_TICKET_ID",
            TicketRejection::NotFound(_) => "TICKET_NOT_FOUND",
            TicketRejection::AlreadyUsed(_) => "TICKET_ALREADY_USED",
            TicketRejection::Expired(_) => "TICKET_EXPIRED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TicketRejection::InvalidId => "Invalid ticket ID",
            TicketRejection::NotFound(_) => "Ticket not found",
            TicketRejection::AlreadyUsed(_) => "Ticket has already been used",
            TicketRejection::Expired(_) => "Ticket has expired",
        }
    }

    pub fn ticket_id(&self) -> Option<&TicketId> {
        match self {
            TicketRejection::InvalidId => None,
            TicketRejection::NotFound(id) => Some(id),
            TicketRejection::AlreadyUsed(summary) | TicketRejection::Expired(summary) => {
                Some(&summary.id)
            }
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            TicketRejection::AlreadyUsed(summary) | TicketRejection::Expired(summary) => {
                serde_json::to_value(summary)
                    .ok()
                    .map(|ticket| serde_json::json!({ "ticket": ticket }))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseInput {
    pub event_id: Uuid,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_phone: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// A purchase with defaults applied, ready to insert.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub id: TicketId,
    pub event_id: Uuid,
    pub member_id: Option<Uuid>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub price_cents: i64,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub ticket_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketStats {
    pub total: i64,
    pub valid: i64,
    pub used: i64,
    pub expired: i64,
    pub revenue: Decimal,
}

impl TicketStats {
    /// Folds per-status `(status, count, price_cents)` aggregates.
    pub fn from_groups(groups: &[(TicketStatus, i64, i64)]) -> Self {
        let mut stats = TicketStats::default();
        let mut revenue_cents = 0i64;
        for &(status, count, cents) in groups {
            stats.total += count;
            match status {
                TicketStatus::Valid => stats.valid += count,
                TicketStatus::Used => stats.used += count,
                TicketStatus::Expired => stats.expired += count,
            }
            if status.counts_as_revenue() {
                revenue_cents += cents;
            }
        }
        stats.revenue = cents_to_price(revenue_cents);
        stats
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketDashboard {
    #[serde(flatten)]
    pub stats: TicketStats,
    pub recent: Vec<TicketWithEvent>,
}

/// Result of a bulk expiry run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExpiredCount {
    pub expired: u64,
}

pub fn buyer_name_or_default(name: Option<String>) -> String {
    non_empty(name).unwrap_or_else(|| DEFAULT_BUYER_NAME.to_string())
}

pub fn buyer_email_or_default(email: Option<String>) -> String {
    non_empty(email).unwrap_or_else(|| DEFAULT_BUYER_EMAIL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_sixteen_upper_hex() {
        let id = TicketId::generate();
        assert_eq!(id.as_str().len(), TICKET_ID_LEN);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        assert_ne!(TicketId::generate(), TicketId::generate());
    }

    #[test]
    fn test_parse_strips_prefix_and_normalizes_case() {
        let id = TicketId::parse("  TICKET:0a1b2c3d4e5f6071 ").unwrap();
        assert_eq!(id.as_str(), "0A1B2C3D4E5F6071");
        assert_eq!(id.qr_payload(), "TICKET:0A1B2C3D4E5F6071");

        let parsed_again = TicketId::parse(&id.qr_payload()).unwrap();
        assert_eq!(parsed_again, id);
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for raw in ["", "TICKET:", "XYZ", "0A1B2C3D4E5F607", "0A1B2C3D4E5F60712", "0A1B2C3D4E5F607G"] {
            assert!(
                matches!(TicketId::parse(raw), Err(TicketRejection::InvalidId)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_ticket_scans_once() {
        let after = TicketStatus::Valid.scan().unwrap();
        assert_eq!(after, TicketStatus::Used);
        assert_eq!(after.scan(), Err(Refusal::AlreadyUsed));
    }

    #[test]
    fn test_expired_ticket_never_scans() {
        assert_eq!(TicketStatus::Expired.scan(), Err(Refusal::Expired));
        assert_eq!(TicketStatus::Valid.expire(), Some(TicketStatus::Expired));
        assert_eq!(TicketStatus::Used.expire(), Some(TicketStatus::Expired));
        assert_eq!(TicketStatus::Expired.expire(), None);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_price_conversion() {
        assert_eq!(price_to_cents(Decimal::new(1000, 2)), Some(1000));
        assert_eq!(price_to_cents(Decimal::new(12345, 3)), Some(1235));
        assert_eq!(price_to_cents(Decimal::ZERO), Some(0));
        assert_eq!(price_to_cents(Decimal::new(-1, 0)), None);
        assert_eq!(cents_to_price(1999).to_string(), "19.99");
    }

    #[test]
    fn test_stats_revenue_excludes_expired() {
        let stats = TicketStats::from_groups(&[
            (TicketStatus::Valid, 2, 2000),
            (TicketStatus::Used, 1, 1500),
            (TicketStatus::Expired, 4, 4000),
        ]);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.valid, 2);
        assert_eq!(stats.used, 1);
        assert_eq!(stats.expired, 4);
        assert_eq!(stats.revenue, Decimal::new(3500, 2));
    }

    #[test]
    fn test_rejection_details_carry_ticket() {
        let summary = TicketSummary {
            id: TicketId::parse("00000000000000AA").unwrap(),
            buyer_name: "Guest".to_string(),
            event_name: "Night meet".to_string(),
            event_date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            status: TicketStatus::Used,
            scanned_at: None,
        };
        let rejection = TicketRejection::refused(Refusal::AlreadyUsed, summary);
        assert_eq!(rejection.code(), "TICKET_ALREADY_USED");
        assert_eq!(rejection.status_code(), StatusCode::CONFLICT);
        let details = rejection.details().unwrap();
        assert_eq!(details["ticket"]["id"], "00000000000000AA");
        assert_eq!(details["ticket"]["status"], "used");
    }

    #[test]
    fn test_price_serializes_from_cents() {
        let ticket = Ticket {
            id: TicketId::parse("00000000000000AA").unwrap(),
            event_id: Uuid::new_v4(),
            member_id: None,
            buyer_name: "Guest".to_string(),
            buyer_email: "guest@example.com".to_string(),
            buyer_phone: None,
            price_cents: 1250,
            status: TicketStatus::Valid,
            purchased_at: Utc::now(),
            scanned_at: None,
            scanned_by: None,
        };
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["price"], "12.50");
        assert!(json.get("price_cents").is_none());
    }

    #[test]
    fn test_buyer_defaults() {
        assert_eq!(buyer_name_or_default(Some("  ".to_string())), "Guest");
        assert_eq!(buyer_email_or_default(None), "guest@example.com");
        assert_eq!(buyer_name_or_default(Some(" Kim ".to_string())), "Kim");
    }
}
