use anyhow::anyhow;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    chats::{Chat, NewChat},
    messages::{FollowUp, Message, NewMessage},
    sessions::UserSession,
};
use crate::services::progress;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct AppendOutcome {
    pub message: Message,
    pub chat: Chat,
    pub follow_up: FollowUp,
}

/// Opens a chat for `user_id` with the mode flags of `enroll_code`.
pub async fn start_chat(
    store: &dyn Store,
    user_id: Uuid,
    enroll_code: &str,
    is_trial: bool,
) -> AppResult<Chat> {
    let code = store
        .get_enroll_code_by_code(enroll_code)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Unknown enroll code")))?;

    let chat = store
        .insert_chat(NewChat::from_enroll_code(user_id, &code, is_trial))
        .await?;
    tracing::info!(chat_id = %chat.id, %user_id, mode = ?chat.mode(), "chat started");
    Ok(chat)
}

async fn load_chat(store: &dyn Store, chat_id: Uuid) -> AppResult<Chat> {
    store
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Chat not found")))
}

/// Loads a chat the session user may change: only its owner.
pub async fn get_owned_chat(
    store: &dyn Store,
    chat_id: Uuid,
    user: &UserSession,
) -> AppResult<Chat> {
    let chat = load_chat(store, chat_id).await?;
    if chat.user_id != user.user_id {
        return Err(AppError::Forbidden(anyhow!("Chat belongs to another user")));
    }
    Ok(chat)
}

/// Loads a chat the session user may read: its owner, or staff.
pub async fn get_readable_chat(
    store: &dyn Store,
    chat_id: Uuid,
    user: &UserSession,
) -> AppResult<Chat> {
    let chat = load_chat(store, chat_id).await?;
    if chat.user_id != user.user_id && !user.is_staff {
        return Err(AppError::Forbidden(anyhow!("Chat belongs to another user")));
    }
    Ok(chat)
}

/// Sets progress directly. Monotonicity is left to the caller.
pub async fn set_progress(store: &dyn Store, chat_id: Uuid, value: i32) -> AppResult<Chat> {
    if value < 0 {
        return Err(AppError::BadRequest(anyhow!("Progress can't be negative")));
    }
    store.update_chat_progress(chat_id, value).await
}

pub async fn set_state(store: &dyn Store, chat_id: Uuid, state: Option<String>) -> AppResult<Chat> {
    let state = state
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let chat = store.update_chat_state(chat_id, state).await?;
    if chat.is_done() {
        tracing::info!(chat_id = %chat.id, progress = chat.progress, "chat finished");
    }
    Ok(chat)
}

pub async fn delete_chat(store: &dyn Store, chat_id: Uuid) -> AppResult<()> {
    if !store.delete_chat(chat_id).await? {
        return Err(AppError::NotFound(anyhow!("Chat not found")));
    }
    tracing::info!(%chat_id, "chat deleted, messages detached");
    Ok(())
}

/// Appends a message and, when its kind counts towards progress, recomputes
/// the chat's progress from the whole conversation.
pub async fn append_message(
    store: &dyn Store,
    chat: &Chat,
    mut new: NewMessage,
) -> AppResult<AppendOutcome> {
    new.chat_id = chat.id;
    new.validate()?;

    let message = store.insert_message(new).await?;
    let follow_up = message.follow_up();

    let mut updated = None;
    if message.kind.advances_progress() {
        if let Some(unit) = store.get_chat_course_unit(chat.id).await? {
            let messages = store.list_chat_messages(chat.id).await?;
            let computed = progress::lesson_progress(&messages, unit.lesson_count);
            // never lowers the stored value
            let chat = store.raise_chat_progress(chat.id, computed).await?;
            tracing::debug!(chat_id = %chat.id, progress = chat.progress, "chat progress recomputed");
            updated = Some(chat);
        }
    }
    let updated = match updated {
        Some(chat) => chat,
        None => store
            .get_chat(chat.id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Chat not found")))?,
    };

    Ok(AppendOutcome {
        message,
        chat: updated,
        follow_up,
    })
}
