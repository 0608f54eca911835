use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::event::Event;
use crate::models::permission::Role;
use crate::models::place::Place;

pub const DASHBOARD_LIST_LEN: i64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ClubStats {
    pub total_members: i64,
    pub total_vehicles: i64,
    pub upcoming_events: i64,
    pub total_tickets: i64,
    pub revenue: Decimal,
}

/// Landing data after login; staff see club totals, members see what's on.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum Dashboard {
    Member {
        role: Role,
        latest_events: Vec<Event>,
        places: Vec<Place>,
    },
    Staff {
        role: Role,
        stats: ClubStats,
    },
}
