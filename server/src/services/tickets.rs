//! Ticket issuance and admission.
//!
//! Status only ever moves forward: `valid -> used`, `valid|used -> expired`.
//! Every transition is a conditional update on the current status, so two
//! scanners racing on one ticket cannot both admit it.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::activity::Action;
use crate::models::event::Event;
use crate::models::member::{non_empty, Member};
use crate::models::ticket::{
    buyer_email_or_default, buyer_name_or_default, price_to_cents, ExpiredCount, NewTicket,
    PurchaseInput, Ticket, TicketDashboard, TicketId, TicketRejection, TicketStats, TicketStatus,
    TicketSummary, TicketView, TicketWithEvent, DEFAULT_PRICE_CENTS,
};
use crate::services::activity;
use crate::store::Store;
use crate::utils::error::{is_unique_violation, AppError, AppResult};
use crate::utils::qr;

const MAX_ID_ATTEMPTS: u32 = 3;
const RECENT_TICKETS: i64 = 10;

pub async fn purchase(
    store: &dyn Store,
    input: PurchaseInput,
    purchaser: Option<Uuid>,
) -> AppResult<TicketView> {
    let event = store
        .event_by_id(input.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let price_cents = match input.price {
        Some(price) => price_to_cents(price).ok_or_else(|| {
            AppError::ValidationError("Price must be a non-negative amount".to_string())
        })?,
        None => DEFAULT_PRICE_CENTS,
    };

    let mut ticket = NewTicket {
        id: TicketId::generate(),
        event_id: event.id,
        member_id: purchaser,
        buyer_name: buyer_name_or_default(input.buyer_name),
        buyer_email: buyer_email_or_default(input.buyer_email),
        buyer_phone: non_empty(input.buyer_phone),
        price_cents,
        purchased_at: Utc::now(),
    };

    let mut attempt = 1;
    loop {
        match store.insert_ticket(&ticket).await {
            Ok(()) => break,
            Err(e) if is_unique_violation(&e) && attempt < MAX_ID_ATTEMPTS => {
                tracing::warn!(ticket = %ticket.id, attempt, "Ticket id collision, regenerating");
                ticket.id = TicketId::generate();
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(ticket = %ticket.id, event = %event.id, "Ticket purchased");
    Ok(issued(ticket, event).into())
}

fn issued(ticket: NewTicket, event: Event) -> TicketWithEvent {
    TicketWithEvent {
        ticket: Ticket {
            id: ticket.id,
            event_id: ticket.event_id,
            member_id: ticket.member_id,
            buyer_name: ticket.buyer_name,
            buyer_email: ticket.buyer_email,
            buyer_phone: ticket.buyer_phone,
            price_cents: ticket.price_cents,
            status: TicketStatus::Valid,
            purchased_at: ticket.purchased_at,
            scanned_at: None,
            scanned_by: None,
        },
        event_title: event.title,
        event_date: event.event_date,
        event_location: event.location,
    }
}

async fn load(store: &dyn Store, id: &TicketId) -> AppResult<TicketWithEvent> {
    store
        .ticket_with_event(id)
        .await?
        .ok_or_else(|| TicketRejection::NotFound(id.clone()).into())
}

/// Explains why `ticket` can no longer be admitted.
fn refusal_for(ticket: &TicketWithEvent) -> AppError {
    match ticket.ticket.status.scan() {
        Err(refusal) => TicketRejection::refused(refusal, ticket.summary()).into(),
        // A conditional update missed yet the ticket still reads `valid`.
        Ok(_) => AppError::Conflict("Ticket changed while scanning, please retry".to_string()),
    }
}

pub async fn view(store: &dyn Store, raw_id: &str) -> AppResult<TicketView> {
    let id = TicketId::parse(raw_id)?;
    Ok(load(store, &id).await?.into())
}

/// PNG QR code for an existing ticket, rendered on demand.
pub async fn qr_png(store: &dyn Store, raw_id: &str) -> AppResult<(TicketId, Vec<u8>)> {
    let id = TicketId::parse(raw_id)?;
    let ticket = load(store, &id).await?;
    let png = qr::render_png(&ticket.ticket.id.qr_payload())
        .map_err(|e| AppError::InternalServerError(format!("QR rendering failed: {e}")))?;
    Ok((ticket.ticket.id, png))
}

/// Admits a ticket at the door.
///
/// A `valid` ticket for an event that has already passed is expired on the
/// spot and refused.
pub async fn scan(
    store: &dyn Store,
    raw_id: &str,
    scanner: &Member,
    today: NaiveDate,
) -> AppResult<TicketSummary> {
    let id = TicketId::parse(raw_id)?;
    let ticket = load(store, &id).await?;

    if ticket.ticket.status == TicketStatus::Valid && ticket.event_date < today {
        if store.expire_ticket(&id, TicketStatus::Valid).await? {
            tracing::info!(ticket = %id, "Ticket expired at scan, event has passed");
        }
        return Err(refusal_for(&load(store, &id).await?));
    }

    if let Err(refusal) = ticket.ticket.status.scan() {
        return Err(TicketRejection::refused(refusal, ticket.summary()).into());
    }

    let scanned_at = Utc::now();
    if !store.mark_ticket_used(&id, scanned_at, &scanner.username).await? {
        tracing::warn!(ticket = %id, "Lost scan race");
        return Err(refusal_for(&load(store, &id).await?));
    }

    tracing::info!(ticket = %id, scanner = %scanner.username, "Ticket admitted");
    let details = format!("{} for {}", id, ticket.event_title);
    activity::record(store, Some(scanner.id), Action::TicketScanned, Some(&details)).await;

    Ok(TicketSummary {
        status: TicketStatus::Used,
        scanned_at: Some(scanned_at),
        ..ticket.summary()
    })
}

/// Manually expires a `valid` or `used` ticket.
pub async fn expire(store: &dyn Store, raw_id: &str) -> AppResult<TicketView> {
    let id = TicketId::parse(raw_id)?;
    let ticket = load(store, &id).await?;

    let current = ticket.ticket.status;
    if current.expire().is_none() {
        return Err(TicketRejection::Expired(ticket.summary()).into());
    }

    if !store.expire_ticket(&id, current).await? {
        // Scanned in the meantime; expire from the new status.
        let reread = load(store, &id).await?;
        match reread.ticket.status {
            TicketStatus::Expired => return Err(TicketRejection::Expired(reread.summary()).into()),
            status => {
                if !store.expire_ticket(&id, status).await? {
                    return Err(AppError::Conflict(
                        "Ticket changed while expiring, please retry".to_string(),
                    ));
                }
            }
        }
    }

    tracing::info!(ticket = %id, from = %current, "Ticket expired");
    Ok(load(store, &id).await?.into())
}

pub async fn expire_past_events(store: &dyn Store, today: NaiveDate) -> AppResult<ExpiredCount> {
    let expired = store.expire_tickets_before(today).await?;
    tracing::info!(expired, %today, "Expired tickets for past events");
    Ok(ExpiredCount { expired })
}

pub async fn stats(store: &dyn Store) -> AppResult<TicketStats> {
    let groups = store.ticket_status_groups().await?;
    Ok(TicketStats::from_groups(&groups))
}

pub async fn dashboard(store: &dyn Store) -> AppResult<TicketDashboard> {
    Ok(TicketDashboard {
        stats: stats(store).await?,
        recent: store.recent_tickets(RECENT_TICKETS).await?,
    })
}

/// Events that can still be bought, soonest first.
pub async fn available_events(store: &dyn Store, today: NaiveDate) -> AppResult<Vec<Event>> {
    Ok(store.upcoming_events(today).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::NewEvent;
    use crate::models::member::NewMember;
    use crate::store::SqliteStore;
    use chrono::Days;
    use rust_decimal::Decimal;

    async fn fixture() -> (SqliteStore, Member) {
        let store = SqliteStore::in_memory().await.unwrap();
        let member = store
            .create_member(&NewMember {
                username: "door".to_string(),
                password_hash: "x".to_string(),
                email: "door@example.com".to_string(),
                first_name: "Door".to_string(),
                last_name: "Keeper".to_string(),
            })
            .await
            .unwrap();
        (store, member)
    }

    async fn event_on(store: &SqliteStore, creator: &Member, date: NaiveDate) -> Event {
        store
            .create_event(&NewEvent {
                title: "Night meet".to_string(),
                description: "Bring snacks".to_string(),
                location: "Lot B - 1 Main St".to_string(),
                event_date: date,
                event_time: None,
                max_attendees: 50,
                created_by: creator.id,
                place_id: None,
            })
            .await
            .unwrap()
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn purchase_for(event: &Event) -> PurchaseInput {
        PurchaseInput {
            event_id: event.id,
            buyer_name: None,
            buyer_email: None,
            buyer_phone: None,
            price: None,
        }
    }

    #[tokio::test]
    async fn test_purchase_applies_defaults() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;

        let view = purchase(&store, purchase_for(&event), None).await.unwrap();
        let ticket = &view.ticket.ticket;
        assert_eq!(ticket.buyer_name, "Guest");
        assert_eq!(ticket.buyer_email, "guest@example.com");
        assert_eq!(ticket.price_cents, 1000);
        assert_eq!(ticket.status, TicketStatus::Valid);
        assert_eq!(view.qr_code_url, format!("/api/tickets/{}/qr", ticket.id));
    }

    #[tokio::test]
    async fn test_purchase_for_unknown_event_is_not_found() {
        let (store, _) = fixture().await;
        let input = PurchaseInput {
            event_id: Uuid::new_v4(),
            buyer_name: None,
            buyer_email: None,
            buyer_phone: None,
            price: None,
        };
        let err = purchase(&store, input, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let input = PurchaseInput {
            price: Some(Decimal::new(-500, 2)),
            ..purchase_for(&event)
        };
        let err = purchase(&store, input, None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_ticket_is_used_at_most_once() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        let admitted = scan(&store, id.as_str(), &member, today()).await.unwrap();
        assert_eq!(admitted.status, TicketStatus::Used);
        assert!(admitted.scanned_at.is_some());

        let err = scan(&store, id.as_str(), &member, today()).await.unwrap_err();
        assert_eq!(err.code(), "TICKET_ALREADY_USED");

        let stored = store.ticket_with_event(&id).await.unwrap().unwrap();
        assert_eq!(stored.ticket.scanned_by.as_deref(), Some("door"));
    }

    #[tokio::test]
    async fn test_scan_accepts_prefixed_lowercase_payload() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        let raw = format!("  TICKET:{}  ", id.as_str().to_lowercase());
        let admitted = scan(&store, &raw, &member, today()).await.unwrap();
        assert_eq!(admitted.id, id);
        assert_eq!(admitted.event_name, "Night meet");
    }

    #[tokio::test]
    async fn test_scan_rejects_malformed_and_unknown_ids() {
        let (store, member) = fixture().await;

        let err = scan(&store, "not-a-ticket", &member, today()).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_TICKET_ID");

        let err = scan(&store, "00000000DEADBEEF", &member, today()).await.unwrap_err();
        assert_eq!(err.code(), "TICKET_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_expired_ticket_rejects_scans() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        let expired = expire(&store, id.as_str()).await.unwrap();
        assert_eq!(expired.ticket.ticket.status, TicketStatus::Expired);

        let err = scan(&store, id.as_str(), &member, today()).await.unwrap_err();
        assert_eq!(err.code(), "TICKET_EXPIRED");

        let err = expire(&store, id.as_str()).await.unwrap_err();
        assert_eq!(err.code(), "TICKET_EXPIRED");
    }

    #[tokio::test]
    async fn test_used_ticket_can_still_be_expired() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        scan(&store, id.as_str(), &member, today()).await.unwrap();
        let expired = expire(&store, id.as_str()).await.unwrap();
        assert_eq!(expired.ticket.ticket.status, TicketStatus::Expired);
    }

    #[tokio::test]
    async fn test_past_event_ticket_expires_lazily_on_scan() {
        let (store, member) = fixture().await;
        let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
        let event = event_on(&store, &member, yesterday).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        let err = scan(&store, id.as_str(), &member, today()).await.unwrap_err();
        assert_eq!(err.code(), "TICKET_EXPIRED");

        let stored = store.ticket_with_event(&id).await.unwrap().unwrap();
        assert_eq!(stored.ticket.status, TicketStatus::Expired);
    }

    #[tokio::test]
    async fn test_bulk_expiry_only_touches_valid_past_tickets() {
        let (store, member) = fixture().await;
        let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
        let past = event_on(&store, &member, yesterday).await;
        let upcoming = event_on(&store, &member, today()).await;

        purchase(&store, purchase_for(&past), None).await.unwrap();
        purchase(&store, purchase_for(&past), None).await.unwrap();
        purchase(&store, purchase_for(&upcoming), None).await.unwrap();

        let result = expire_past_events(&store, today()).await.unwrap();
        assert_eq!(result.expired, 2);

        let again = expire_past_events(&store, today()).await.unwrap();
        assert_eq!(again.expired, 0);
    }

    #[tokio::test]
    async fn test_dashboard_revenue_excludes_expired() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;

        let a = purchase(&store, purchase_for(&event), None).await.unwrap();
        let b = purchase(&store, purchase_for(&event), None).await.unwrap();
        let c = purchase(
            &store,
            PurchaseInput {
                price: Some(Decimal::new(2550, 2)),
                ..purchase_for(&event)
            },
            None,
        )
        .await
        .unwrap();

        scan(&store, a.ticket.ticket.id.as_str(), &member, today())
            .await
            .unwrap();
        expire(&store, b.ticket.ticket.id.as_str()).await.unwrap();

        let board = dashboard(&store).await.unwrap();
        assert_eq!(board.stats.total, 3);
        assert_eq!(board.stats.valid, 1);
        assert_eq!(board.stats.used, 1);
        assert_eq!(board.stats.expired, 1);
        // 10.00 used + 25.50 valid
        assert_eq!(board.stats.revenue, Decimal::new(3550, 2));
        assert_eq!(board.recent.len(), 3);
        assert_eq!(board.recent[0].ticket.id, c.ticket.ticket.id);
    }

    #[tokio::test]
    async fn test_concurrent_scans_admit_exactly_once() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        let (first, second) = tokio::join!(
            scan(&store, id.as_str(), &member, today()),
            scan(&store, id.as_str(), &member, today()),
        );
        let admitted = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn test_available_events_skip_past_ones() {
        let (store, member) = fixture().await;
        let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
        event_on(&store, &member, yesterday).await;
        let upcoming = event_on(&store, &member, today()).await;

        let events = available_events(&store, today()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, upcoming.id);
    }

    #[tokio::test]
    async fn test_qr_png_for_known_ticket_only() {
        let (store, member) = fixture().await;
        let event = event_on(&store, &member, today()).await;
        let id = purchase(&store, purchase_for(&event), None)
            .await
            .unwrap()
            .ticket
            .ticket
            .id;

        let (rendered_for, png) = qr_png(&store, id.as_str()).await.unwrap();
        assert_eq!(rendered_for, id);
        assert!(png.starts_with(b"\x89PNG"));

        let err = qr_png(&store, "FFFFFFFFFFFFFFFF").await.unwrap_err();
        assert_eq!(err.code(), "TICKET_NOT_FOUND");
    }
}
