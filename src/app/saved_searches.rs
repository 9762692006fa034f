use super::{ApiResponse, ok, parse_id};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state;
use crate::types::saved_search::{SavedSearch, SearchCriteria};

use axum::Extension;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSavedSearchRequest {
    #[serde(default)]
    criteria: SearchCriteria,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    alerts_enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletedSavedSearch {
    id: Uuid,
}

pub(crate) async fn saved_search_create(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    request: Result<Json<CreateSavedSearchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SavedSearch>>), AppError> {
    let Json(request) = request?;
    let saved_search = state
        .saved_searches
        .create(
            &user.user_id,
            request.title.as_deref(),
            request.criteria,
            request.alerts_enabled,
        )
        .await?;
    Ok((StatusCode::CREATED, ok(saved_search)))
}

pub(crate) async fn saved_search_list(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<SavedSearch>>>, AppError> {
    let saved_searches = state.saved_searches.list_for_owner(&user.user_id).await?;
    Ok(ok(saved_searches))
}

pub(crate) async fn saved_search_delete(
    State(state): State<state::AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedSavedSearch>>, AppError> {
    let id = parse_id(&id)?;
    state.saved_searches.delete(id, &user.user_id).await?;
    Ok(ok(DeletedSavedSearch { id }))
}
