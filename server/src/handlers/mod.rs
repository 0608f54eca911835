use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::response::success;

pub mod activity;
pub mod auth;
pub mod blog;
pub mod dashboard;
pub mod events;
pub mod members;
pub mod permissions;
pub mod places;
pub mod profile;
pub mod tickets;
pub mod vehicles;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "carmeet-api",
    };

    success(payload, "Health check successful").into_response()
}

/// Calendar date (UTC) used for "upcoming" and "past" cut-offs.
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
