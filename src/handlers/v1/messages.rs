use anyhow::anyhow;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::{session_user, v1::validate_payload};
use crate::models::messages::{
    ContentRef, InputType, MessageKind, MessageType, NewMessage, OptionSet, SubKind,
};
use crate::models::websocket::WebSocketMessage;
use crate::services::chats;
use crate::{app_state::AppState, error::AppResult};

pub async fn list_messages(
    State(state): State<AppState>,
    session: Session,
    Path(chat_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    chats::get_readable_chat(state.store.as_ref(), chat_id, &user).await?;
    let messages = state.store.list_chat_messages(chat_id).await?;
    Ok(Json(messages))
}

#[derive(Deserialize, Validate)]
pub struct MessagePayload {
    pub kind: MessageKind,
    pub input_type: Option<InputType>,
    #[serde(default, rename = "type")]
    pub message_type: MessageType,
    #[validate(length(max = 20000, message = "text is too long"))]
    pub text: Option<String>,
    pub options: Option<OptionSet>,
    pub sub_kind: Option<SubKind>,
    pub content: Option<ContentRef>,
    pub lesson_to_answer_id: Option<i64>,
    pub response_to_check_id: Option<i64>,
    pub student_error_id: Option<i64>,
    #[serde(default)]
    pub is_additional: bool,
}

pub async fn append_message(
    State(state): State<AppState>,
    session: Session,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<MessagePayload>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    validate_payload(&payload)?;
    let chat = chats::get_owned_chat(state.store.as_ref(), chat_id, &user).await?;

    let new = NewMessage {
        chat_id,
        owner_id: user.user_id,
        kind: payload.kind,
        input_type: payload.input_type,
        message_type: payload.message_type,
        text: payload.text,
        options: payload.options,
        sub_kind: payload.sub_kind,
        content: payload.content,
        lesson_to_answer_id: payload.lesson_to_answer_id,
        response_to_check_id: payload.response_to_check_id,
        student_error_id: payload.student_error_id,
        is_additional: payload.is_additional,
    };
    let outcome = chats::append_message(state.store.as_ref(), &chat, new).await?;

    if chat.is_live {
        state.websocket_manager.broadcast_to_chat(
            chat_id,
            WebSocketMessage::MessageAdded {
                chat_id,
                message_id: outcome.message.id,
                kind: outcome.message.kind,
                follow_up: outcome.follow_up,
                html: outcome.message.get_html(),
                timestamp: outcome.message.timestamp,
            },
        );
        if outcome.chat.progress != chat.progress {
            state.websocket_manager.broadcast_to_chat(
                chat_id,
                WebSocketMessage::ProgressChanged {
                    chat_id,
                    progress: outcome.chat.progress,
                },
            );
        }
    }

    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn message_html(
    State(state): State<AppState>,
    session: Session,
    Path(message_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    let message = state
        .store
        .get_message(message_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Message not found")))?;

    match message.chat_id {
        Some(chat_id) => {
            chats::get_readable_chat(state.store.as_ref(), chat_id, &user).await?;
        }
        // detached messages are only visible to their author and staff
        None if message.owner_id != user.user_id && !user.is_staff => {
            return Err(AppError::Forbidden(anyhow!("Message belongs to another user")));
        }
        None => {}
    }

    Ok(Html(message.get_html()))
}
