pub mod v1;

use anyhow::anyhow;
use axum::Json;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::error::{AppError, AppResult};
use crate::models::sessions::UserSession;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// The user the login layer put in the session.
pub async fn session_user(session: &Session) -> AppResult<UserSession> {
    session
        .get::<UserSession>("user")
        .await
        .map_err(|_| AppError::Unauthorized(anyhow!("Cannot find user session")))?
        .ok_or_else(|| AppError::Unauthorized(anyhow!("User session not found")))
}
