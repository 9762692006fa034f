use crate::error::AppError;
use crate::state;

use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub(crate) async fn auth_middleware(
    State(state): State<state::AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if is_auth_bypass_path(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        return AppError::Unauthorized.into_response();
    };

    match state.auth.verify_token(token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, path = %req.uri().path(), "rejected bearer token");
            AppError::Unauthorized.into_response()
        }
    }
}

/// The websocket authenticates inside its join message instead.
fn is_auth_bypass_path(path: &str) -> bool {
    path == "/health" || path == "/ws"
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
