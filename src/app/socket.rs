use crate::realtime::{ConnectionId, ConnectionState, JOIN_EVENT};
use crate::state;
use crate::types::UserId;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

const JOINED_EVENT: &str = "joined";
const JOIN_ERROR_EVENT: &str = "join_error";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientMessage {
    event: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

pub(crate) async fn socket_upgrade(
    State(state): State<state::AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| session(state, socket))
}

async fn session(state: state::AppState, mut socket: WebSocket) {
    let (connection, mut outbound) = state.registry.connect();
    let mut connection_state = ConnectionState::Connecting;
    tracing::debug!(connection, "websocket connected");

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                let reply = match join(&state, connection, text.as_str()) {
                    Ok(user_id) => {
                        tracing::info!(connection, user = %user_id, "websocket joined");
                        let reply = json!({"event": JOINED_EVENT, "data": {"userId": user_id}});
                        connection_state = ConnectionState::Joined(user_id);
                        reply
                    }
                    Err(reason) => {
                        tracing::debug!(connection, reason, "websocket join rejected");
                        json!({"event": JOIN_ERROR_EVENT, "data": {"message": reason}})
                    }
                };
                if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.registry.leave(connection);
    let previous = std::mem::replace(&mut connection_state, ConnectionState::Disconnected);
    tracing::debug!(connection, state = ?previous, "websocket disconnected");
}

/// The user id is taken from the verified token; a declared `userId` must
/// agree with it.
fn join(
    state: &state::AppState,
    connection: ConnectionId,
    raw: &str,
) -> Result<UserId, &'static str> {
    let message: ClientMessage = serde_json::from_str(raw).map_err(|_| "malformed message")?;
    if message.event != JOIN_EVENT {
        return Err("unsupported event");
    }
    let token = message.token.as_deref().ok_or("token is required")?;
    let user = state
        .auth
        .verify_token(token)
        .map_err(|_| "invalid token")?;
    if let Some(declared) = message.user_id.as_deref()
        && declared.trim() != user.user_id
    {
        return Err("userId does not match token");
    }
    if !state.registry.join(&user.user_id, connection) {
        return Err("connection closed");
    }
    Ok(user.user_id)
}
