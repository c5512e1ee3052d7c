use anyhow::anyhow;
use axum::response::IntoResponse;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::handlers::session_user;
use crate::{app_state::AppState, error::AppResult};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct AdminMessagesQuery {
    pub limit: Option<i64>,
}

/// Latest messages with the id and state of the chat they belong to.
pub async fn list_messages(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminMessagesQuery>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    if !user.is_staff {
        return Err(AppError::Forbidden(anyhow!("Staff only")));
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rows = state.store.list_admin_messages(limit).await?;
    Ok(Json(rows))
}
