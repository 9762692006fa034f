use super::{ApiResponse, ok, parse_id};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::notifications::manager::DEFAULT_PAGE_SIZE;
use crate::notifications::{ListQuery, NotificationDraft};
use crate::ports::ListingStore;
use crate::state;
use crate::types::notification::Notification;

use axum::Extension;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationListQuery {
    page: Option<usize>,
    limit: Option<usize>,
    unread_only: Option<bool>,
}

/// Activity reported by the messaging and review services. The caller is the
/// sender or reviewer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ActivityEvent {
    NewMessage {
        #[serde(rename = "recipientId")]
        recipient_id: String,
        #[serde(rename = "senderName")]
        sender_name: String,
        #[serde(rename = "listingTitle")]
        listing_title: String,
        #[serde(rename = "messageId")]
        message_id: Uuid,
    },
    NewReview {
        #[serde(rename = "listingId")]
        listing_id: Uuid,
        #[serde(rename = "reviewerName")]
        reviewer_name: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationListResponse {
    notifications: Vec<Notification>,
    unread_count: usize,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub(crate) struct Pagination {
    page: usize,
    limit: usize,
    total: usize,
    pages: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnreadCount {
    count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkedRead {
    updated: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct Deleted {
    deleted: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletedNotification {
    id: Uuid,
}

pub(crate) async fn notification_list(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<NotificationListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<NotificationListResponse>>, AppError> {
    let Query(query) = query?;
    let page = state
        .notifications
        .list_for_user(
            &user.user_id,
            ListQuery {
                unread_only: query.unread_only.unwrap_or(false),
                page: query.page.unwrap_or(1),
                page_size: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            },
        )
        .await?;

    let pagination = Pagination {
        page: page.page,
        limit: page.page_size,
        total: page.total,
        pages: page.pages(),
    };
    Ok(ok(NotificationListResponse {
        notifications: page.items,
        unread_count: page.unread_count,
        pagination,
    }))
}

pub(crate) async fn notification_unread_count(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UnreadCount>>, AppError> {
    let count = state.notifications.unread_count(&user.user_id).await?;
    Ok(ok(UnreadCount { count }))
}

pub(crate) async fn notification_read(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notification>>, AppError> {
    let id = parse_id(&id)?;
    let notification = state.notifications.mark_read(id, &user.user_id).await?;
    Ok(ok(notification))
}

pub(crate) async fn notification_read_all(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<MarkedRead>>, AppError> {
    let updated = state.notifications.mark_all_read(&user.user_id).await?;
    tracing::debug!(user = %user.user_id, updated, "marked all notifications read");
    Ok(ok(MarkedRead { updated }))
}

pub(crate) async fn notification_delete(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedNotification>>, AppError> {
    let id = parse_id(&id)?;
    state.notifications.delete(id, &user.user_id).await?;
    Ok(ok(DeletedNotification { id }))
}

pub(crate) async fn notification_clear_all(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let deleted = state.notifications.delete_all(&user.user_id).await?;
    tracing::debug!(user = %user.user_id, deleted, "cleared notifications");
    Ok(ok(Deleted { deleted }))
}

pub(crate) async fn notification_event_create(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    event: Result<Json<ActivityEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Notification>>), AppError> {
    let Json(event) = event?;
    let draft = match event {
        ActivityEvent::NewMessage {
            recipient_id,
            sender_name,
            listing_title,
            message_id,
        } => {
            if recipient_id.trim() == user.user_id {
                return Err(AppError::Validation(
                    "cannot notify yourself about your own message".to_string(),
                ));
            }
            NotificationDraft::new_message(
                recipient_id.trim(),
                &user.user_id,
                sender_name.trim(),
                listing_title.trim(),
                message_id,
            )
        }
        ActivityEvent::NewReview {
            listing_id,
            reviewer_name,
        } => {
            let listing = ListingStore::get(&state.store, listing_id)
                .await?
                .ok_or(AppError::NotFound)?;
            if listing.owner_user_id == user.user_id {
                return Err(AppError::Validation(
                    "cannot review your own listing".to_string(),
                ));
            }
            NotificationDraft::new_review(&listing, reviewer_name.trim())
        }
    };

    let notification = state.notifier.notify(draft).await?;
    Ok((StatusCode::CREATED, ok(notification)))
}
