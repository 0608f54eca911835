use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    activity, auth, blog, dashboard, events, health_check, members, permissions, places, profile,
    tickets, vehicles,
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let security = create_security_headers_layer(&state.config);
    let cors = create_cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(security)
        .layer(cors)
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(club_routes())
        .merge(event_routes())
        .merge(ticket_routes())
        .merge(blog_routes())
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/me", get(profile::me).put(profile::update_me))
        .route("/me/password", post(profile::change_password))
        .route("/dashboard", get(dashboard::show))
}

fn club_routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(members::list))
        .route("/members/:id", get(members::show).put(members::update))
        .route("/permissions", get(permissions::overview))
        .route("/permissions/:member_id", put(permissions::update))
        .route("/vehicles", get(vehicles::list).post(vehicles::create))
        .route("/vehicles/:id", get(vehicles::show).put(vehicles::update))
        .route("/places", get(places::list).post(places::create))
        .route("/activity", get(activity::recent))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(events::list).post(events::create))
        .route("/events/:id", get(events::show))
        .route("/events/:id/rsvps", get(events::rsvps).post(events::rsvp))
        .route("/events/:id/comments", post(events::comment))
}

fn ticket_routes() -> Router<AppState> {
    // QR codes are rendered per request and must not be cached.
    let no_store = SetResponseHeaderLayer::overriding(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Router::new()
        .route("/tickets", post(tickets::purchase))
        .route("/tickets/events", get(tickets::available_events))
        .route("/tickets/scan", post(tickets::scan))
        .route("/tickets/dashboard", get(tickets::dashboard))
        .route("/tickets/expire-past", post(tickets::expire_past))
        .route("/tickets/:id", get(tickets::show))
        .route("/tickets/:id/qr", get(tickets::qr).layer(no_store))
        .route("/tickets/:id/expire", post(tickets::expire))
}

fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/blog", get(blog::list).post(blog::create))
        .route("/blog/:id", get(blog::show))
        .route("/blog/:id/comments", post(blog::comment))
        .route("/blog/:id/like", post(blog::like))
}
