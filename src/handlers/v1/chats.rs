use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{session_user, v1::validate_payload};
use crate::models::websocket::WebSocketMessage;
use crate::services::chats;
use crate::{app_state::AppState, error::AppResult};

#[derive(Deserialize, Validate)]
pub struct StartChatPayload {
    #[validate(length(min = 1, max = 32, message = "enroll_code must be 1-32 characters"))]
    pub enroll_code: String,
    #[serde(default)]
    pub is_trial: bool,
}

pub async fn start_chat(
    State(state): State<AppState>,
    session: Session,
    Json(mut payload): Json<StartChatPayload>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    payload.enroll_code = payload.enroll_code.trim().to_string();
    validate_payload(&payload)?;

    let chat = chats::start_chat(
        state.store.as_ref(),
        user.user_id,
        &payload.enroll_code,
        payload.is_trial,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

pub async fn get_chat(
    State(state): State<AppState>,
    session: Session,
    Path(chat_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    let chat = chats::get_readable_chat(state.store.as_ref(), chat_id, &user).await?;
    Ok(Json(chat))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    session: Session,
    Path(chat_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    chats::get_owned_chat(state.store.as_ref(), chat_id, &user).await?;
    chats::delete_chat(state.store.as_ref(), chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Validate)]
pub struct ProgressPayload {
    #[validate(range(min = 0, message = "progress can't be negative"))]
    pub progress: i32,
}

pub async fn set_progress(
    State(state): State<AppState>,
    session: Session,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<ProgressPayload>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    validate_payload(&payload)?;
    chats::get_owned_chat(state.store.as_ref(), chat_id, &user).await?;

    let chat = chats::set_progress(state.store.as_ref(), chat_id, payload.progress).await?;
    if chat.is_live {
        state.websocket_manager.broadcast_to_chat(
            chat.id,
            WebSocketMessage::ProgressChanged {
                chat_id: chat.id,
                progress: chat.progress,
            },
        );
    }
    Ok(Json(chat))
}

#[derive(Deserialize, Validate)]
pub struct StatePayload {
    #[validate(length(max = 64, message = "state names are at most 64 characters"))]
    pub state: Option<String>,
}

pub async fn set_state(
    State(state): State<AppState>,
    session: Session,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<StatePayload>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    validate_payload(&payload)?;
    chats::get_owned_chat(state.store.as_ref(), chat_id, &user).await?;

    let chat = chats::set_state(state.store.as_ref(), chat_id, payload.state).await?;
    if chat.is_live {
        state.websocket_manager.broadcast_to_chat(
            chat.id,
            WebSocketMessage::StateChanged {
                chat_id: chat.id,
                state: chat.state.clone(),
            },
        );
    }
    Ok(Json(chat))
}
