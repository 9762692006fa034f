use super::{ApiResponse, ok, parse_id};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::notifications::NotificationDraft;
use crate::ports::ListingStore;
use crate::state;
use crate::types::listing::{Listing, ListingStatus, ListingType};

use axum::Extension;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateListingRequest {
    #[serde(alias = "type")]
    listing_type: ListingType,
    title: String,
    price: u64,
    #[serde(alias = "bedrooms")]
    bedroom_count: u32,
    #[serde(default)]
    district: String,
    #[serde(default)]
    furnished: bool,
    #[serde(default)]
    near_campus: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Admin listings go live immediately and skip alerting; everything else
/// waits for approval.
pub(crate) async fn listing_create(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    request: Result<Json<CreateListingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Listing>>), AppError> {
    if !user.can_list() {
        return Err(AppError::Forbidden);
    }
    let Json(request) = request?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let listing = Listing {
        id: Uuid::new_v4(),
        owner_user_id: user.user_id.clone(),
        listing_type: request.listing_type,
        title: title.to_string(),
        price: request.price,
        bedroom_count: request.bedroom_count,
        district: request.district.trim().to_string(),
        furnished: request.furnished,
        near_campus: request.near_campus,
        status: if user.is_admin() {
            ListingStatus::Active
        } else {
            ListingStatus::Pending
        },
    };
    ListingStore::insert(&state.store, listing.clone()).await?;
    tracing::info!(
        listing_id = %listing.id,
        owner = %listing.owner_user_id,
        status = listing.status.as_str(),
        "listing created"
    );
    Ok((StatusCode::CREATED, ok(listing)))
}

pub(crate) async fn listing_get(
    State(state): State<state::AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Listing>>, AppError> {
    let id = parse_id(&id)?;
    let listing = ListingStore::get(&state.store, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ok(listing))
}

/// Commits the status change and answers right away. Alerting runs on the
/// fan-out worker; owner notices are best-effort.
pub(crate) async fn listing_status_update(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    request: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Listing>>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    let Json(request) = request?;
    let id = parse_id(&id)?;
    let status = ListingStatus::parse(&request.status).ok_or_else(|| {
        AppError::Validation(format!(
            "status must be one of active, pending, sold, rented, inactive; got '{}'",
            request.status
        ))
    })?;

    let change = ListingStore::update_status(&state.store, id, status)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(
        listing_id = %id,
        from = change.previous.as_str(),
        to = status.as_str(),
        admin = %user.user_id,
        "listing status changed"
    );

    if change.is_activation() {
        if let Err(err) = state.fan_out.submit(change.listing.clone()) {
            tracing::error!(listing_id = %id, error = %err, "failed to queue saved-search fan-out");
        }
        notify_owner(&state, NotificationDraft::listing_approved(&change.listing)).await;
    } else if status == ListingStatus::Inactive && change.previous != ListingStatus::Inactive {
        notify_owner(
            &state,
            NotificationDraft::listing_rejected(&change.listing, request.reason.as_deref()),
        )
        .await;
    }

    Ok(ok(change.listing))
}

async fn notify_owner(state: &state::AppState, draft: NotificationDraft) {
    let recipient = draft.recipient.clone();
    if let Err(err) = state.notifier.notify(draft).await {
        tracing::warn!(%recipient, error = %err, "failed to notify listing owner");
    }
}
