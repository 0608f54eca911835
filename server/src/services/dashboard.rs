use chrono::NaiveDate;

use crate::auth::CurrentMember;
use crate::models::dashboard::{ClubStats, Dashboard, DASHBOARD_LIST_LEN};
use crate::models::permission::Role;
use crate::services::tickets;
use crate::store::Store;
use crate::utils::error::AppResult;

/// Plain members get what's coming up; moderators and admins get club totals.
pub async fn for_member(
    store: &dyn Store,
    current: &CurrentMember,
    today: NaiveDate,
) -> AppResult<Dashboard> {
    let role = current.role();
    if role == Role::Member {
        return Ok(Dashboard::Member {
            role,
            latest_events: store.latest_events(DASHBOARD_LIST_LEN).await?,
            places: store.list_places(Some(DASHBOARD_LIST_LEN)).await?,
        });
    }

    Ok(Dashboard::Staff {
        role,
        stats: club_stats(store, today).await?,
    })
}

pub async fn club_stats(store: &dyn Store, today: NaiveDate) -> AppResult<ClubStats> {
    let tickets = tickets::stats(store).await?;
    Ok(ClubStats {
        total_members: store.count_members().await?,
        total_vehicles: store.count_vehicles().await?,
        upcoming_events: store.count_upcoming_events(today).await?,
        total_tickets: tickets.total,
        revenue: tickets.revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::{Member, NewMember};
    use crate::models::permission::Capabilities;
    use crate::store::SqliteStore;
    use chrono::Utc;

    async fn member(store: &SqliteStore) -> Member {
        store
            .create_member(&NewMember {
                username: "dash".to_string(),
                password_hash: "x".to_string(),
                email: "dash@example.com".to_string(),
                first_name: "Dee".to_string(),
                last_name: "Ash".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_plain_member_sees_member_view() {
        let store = SqliteStore::in_memory().await.unwrap();
        let member = member(&store).await;
        let current = CurrentMember {
            member,
            capabilities: Capabilities::default(),
        };

        let dashboard = for_member(&store, &current, Utc::now().date_naive())
            .await
            .unwrap();
        assert!(matches!(dashboard, Dashboard::Member { role: Role::Member, .. }));
    }

    #[tokio::test]
    async fn test_moderator_sees_club_stats() {
        let store = SqliteStore::in_memory().await.unwrap();
        let member = member(&store).await;
        let current = CurrentMember {
            member,
            capabilities: Capabilities {
                can_post_events: true,
                ..Capabilities::default()
            },
        };

        let dashboard = for_member(&store, &current, Utc::now().date_naive())
            .await
            .unwrap();
        match dashboard {
            Dashboard::Staff { role, stats } => {
                assert_eq!(role, Role::Moderator);
                assert_eq!(stats.total_members, 1);
                assert_eq!(stats.total_vehicles, 0);
                assert_eq!(stats.total_tickets, 0);
            }
            other => panic!("expected staff view, got {:?}", other),
        }
    }
}
