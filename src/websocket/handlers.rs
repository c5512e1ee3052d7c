use anyhow::anyhow;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    handlers::session_user,
    models::websocket::WebSocketMessage,
    services::chats::get_owned_chat,
};

#[derive(Deserialize)]
pub struct LiveChatQuery {
    pub chat_id: Uuid,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LiveChatQuery>,
) -> AppResult<Response> {
    let user = session_user(&session).await?;
    let chat = get_owned_chat(state.store.as_ref(), query.chat_id, &user).await?;
    if !chat.is_live {
        return Err(AppError::BadRequest(anyhow!(
            "Only live chats can be followed"
        )));
    }

    let user_id = user.user_id;
    Ok(ws.on_upgrade(move |socket| handle_websocket(socket, state, chat.id, user_id)))
}

async fn handle_websocket(socket: WebSocket, state: AppState, chat_id: Uuid, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<WebSocketMessage>();

    let outgoing_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&message) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state
        .websocket_manager
        .join_chat(chat_id, connection_id, user_id, tx.clone());

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = reply_to(text.as_str());
                if tx.send(reply).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(%user_id, error = %e, "websocket receive failed");
                break;
            }
            _ => {}
        }
    }

    state.websocket_manager.leave_chat(chat_id, connection_id);
    outgoing_task.abort();
    tracing::debug!(%user_id, %chat_id, "websocket closed");
}

// the feed is read-only; clients may only ping
fn reply_to(text: &str) -> WebSocketMessage {
    match serde_json::from_str::<WebSocketMessage>(text) {
        Ok(WebSocketMessage::Ping) => WebSocketMessage::Pong,
        Ok(_) => WebSocketMessage::Error {
            message: "Live chat feeds are read-only".to_string(),
        },
        Err(_) => WebSocketMessage::Error {
            message: "Invalid message".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_gets_pong_and_anything_else_an_error() {
        assert!(matches!(reply_to(r#"{"type":"ping"}"#), WebSocketMessage::Pong));
        assert!(matches!(
            reply_to(r#"{"type":"pong"}"#),
            WebSocketMessage::Error { .. }
        ));
        assert!(matches!(reply_to("not json"), WebSocketMessage::Error { .. }));
    }
}
