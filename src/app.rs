use crate::state;

use axum::Json;
use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use serde::Serialize;

mod auth;
mod listings;
mod notifications;
mod saved_searches;
mod socket;

pub fn app(state: state::AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(socket::socket_upgrade))
        .route("/api/listings", post(listings::listing_create))
        .route("/api/listings/{id}", get(listings::listing_get))
        .route(
            "/api/listings/{id}/status",
            put(listings::listing_status_update),
        )
        .route(
            "/api/saved-searches",
            get(saved_searches::saved_search_list).post(saved_searches::saved_search_create),
        )
        .route(
            "/api/saved-searches/{id}",
            delete(saved_searches::saved_search_delete),
        )
        .route(
            "/api/notifications",
            get(notifications::notification_list),
        )
        .route(
            "/api/notifications/events",
            post(notifications::notification_event_create),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::notification_unread_count),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::notification_read_all),
        )
        .route(
            "/api/notifications/clear-all",
            delete(notifications::notification_clear_all),
        )
        .route(
            "/api/notifications/{id}/read",
            put(notifications::notification_read),
        )
        .route(
            "/api/notifications/{id}",
            delete(notifications::notification_delete),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T> {
    success: bool,
    data: T,
}

pub(crate) fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub(crate) fn parse_id(raw: &str) -> Result<uuid::Uuid, crate::error::AppError> {
    uuid::Uuid::parse_str(raw.trim())
        .map_err(|_| crate::error::AppError::Validation(format!("invalid id '{raw}'")))
}
