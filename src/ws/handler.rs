use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::state::AppState;
use crate::ws::{
    error_text, msg_types, CallRequestPayload, ChannelMessage, ClientHandle, ConnState,
    EnterMeetingPayload, SentMessagePayload,
};

/// WebSocket routes
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// WebSocket upgrade handler. Connections upgrade unauthenticated; the
/// ENTER-MEETING event carries the token and performs authentication.
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one WebSocket connection through its whole lifecycle
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();

    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    // Channel for events destined to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ChannelMessage>();

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Task for sending events to the client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut conn_state = ConnState::Connected;

    // Process incoming events
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_event(&text, &conn_id, &tx, &mut conn_state, &state).await;
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close received");
                break;
            }
            Err(e) => {
                tracing::error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Disconnect: peers are notified and the slot released only if this
    // connection actually completed entry.
    if let ConnState::InRoom {
        meeting_id,
        peer_id,
        ..
    } = &conn_state
    {
        state.connections.broadcast_to_room(
            meeting_id,
            ChannelMessage::peer_disconnected(peer_id),
            Some(&conn_id),
        );
        state.connections.remove_client_from_room(meeting_id, &conn_id);
        state.registry.leave(meeting_id);

        tracing::info!(
            conn_id = %conn_id,
            meeting_id = %meeting_id,
            "Peer left meeting"
        );
    }
    conn_state = ConnState::Disconnected;
    tracing::debug!(conn_id = %conn_id, state = ?conn_state, "Connection closed");

    send_task.abort();
}

/// Dispatch one inbound event according to the connection state
async fn handle_event(
    text: &str,
    conn_id: &str,
    tx: &mpsc::UnboundedSender<ChannelMessage>,
    conn_state: &mut ConnState,
    state: &AppState,
) {
    let event: ChannelMessage = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Discarding unparseable frame");
            return;
        }
    };

    match event.msg_type.as_str() {
        msg_types::ENTER_MEETING => {
            handle_enter(event.payload, conn_id, tx, conn_state, state).await;
        }
        msg_types::SENT_MESSAGE => {
            handle_sent_message(event.payload, conn_id, conn_state, state);
        }
        msg_types::CALL_REQUEST => {
            handle_call_request(event.payload, conn_id, conn_state, state);
        }
        other => {
            tracing::debug!(conn_id = %conn_id, msg_type = %other, "Unknown event type");
        }
    }
}

/// ENTER-MEETING: authenticate, admit, and subscribe the connection
async fn handle_enter(
    payload: serde_json::Value,
    conn_id: &str,
    tx: &mpsc::UnboundedSender<ChannelMessage>,
    conn_state: &mut ConnState,
    state: &AppState,
) {
    if !matches!(conn_state, ConnState::Connected) {
        tracing::debug!(conn_id = %conn_id, "ENTER-MEETING ignored after entry");
        return;
    }

    let payload: EnterMeetingPayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(_) => {
            let _ = tx.send(ChannelMessage::error(error_text::AUTH_FAILED));
            return;
        }
    };

    let (Some(jwt), Some(peer_id)) = (payload.jwt, payload.peer_id) else {
        let _ = tx.send(ChannelMessage::error(error_text::AUTH_FAILED));
        return;
    };

    // Claims are trusted only once the signature checks out; capacity and
    // existence checks run strictly after this point.
    let claims = match state.auth.verify_token(&jwt) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Token rejected");
            let _ = tx.send(ChannelMessage::error(error_text::AUTH_FAILED));
            return;
        }
    };

    // Admission is a single check-and-increment; two racing entries cannot
    // both take the last slot.
    if !state.registry.try_enter(&claims.meeting) {
        let _ = tx.send(ChannelMessage::error(error_text::MEETING_FULL));
        return;
    }

    // The meeting may have aged out of the store since the token was issued.
    match state.meeting_repo.get_meeting(&claims.meeting).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            state.registry.leave(&claims.meeting);
            let _ = tx.send(ChannelMessage::error(error_text::MEETING_EXPIRED));
            return;
        }
        Err(e) => {
            state.registry.leave(&claims.meeting);
            tracing::error!(conn_id = %conn_id, error = %e, "Meeting lookup failed during entry");
            let _ = tx.send(ChannelMessage::error(error_text::STORAGE));
            return;
        }
    }

    // Subscribe to the room, then confirm to the caller only.
    let room = state.connections.get_or_create_room(&claims.meeting);
    room.add_client(ClientHandle::new(conn_id.to_string(), tx.clone()));
    let _ = tx.send(ChannelMessage::enter_success());

    tracing::info!(
        conn_id = %conn_id,
        meeting_id = %claims.meeting,
        username = %claims.username,
        "Peer entered meeting"
    );

    *conn_state = ConnState::InRoom {
        meeting_id: claims.meeting,
        username: claims.username,
        peer_id,
    };
}

/// SENT-MESSAGE: relay chat text to the other room subscribers
fn handle_sent_message(
    payload: serde_json::Value,
    conn_id: &str,
    conn_state: &ConnState,
    state: &AppState,
) {
    let ConnState::InRoom {
        meeting_id,
        username,
        ..
    } = conn_state
    else {
        tracing::debug!(conn_id = %conn_id, "SENT-MESSAGE before entry dropped");
        return;
    };

    let Ok(payload) = serde_json::from_value::<SentMessagePayload>(payload) else {
        return;
    };
    let Some(message) = payload.message.filter(|m| !m.is_empty()) else {
        return;
    };

    state.connections.broadcast_to_room(
        meeting_id,
        ChannelMessage::received_message(&message, username),
        Some(conn_id),
    );
}

/// CALL-REQUEST: relay the caller's peer id for WebRTC discovery
fn handle_call_request(
    payload: serde_json::Value,
    conn_id: &str,
    conn_state: &ConnState,
    state: &AppState,
) {
    let ConnState::InRoom { meeting_id, .. } = conn_state else {
        tracing::debug!(conn_id = %conn_id, "CALL-REQUEST before entry dropped");
        return;
    };

    let Ok(payload) = serde_json::from_value::<CallRequestPayload>(payload) else {
        return;
    };

    state.connections.broadcast_to_room(
        meeting_id,
        ChannelMessage::call_request(&payload.peer_id),
        Some(conn_id),
    );
}
