use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{extract::State, Json};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::handlers::{session_user, v1::validate_payload};
use crate::services::enroll_codes;
use crate::{app_state::AppState, error::AppResult};

#[derive(Deserialize, Validate)]
pub struct SharedCodePayload {
    #[validate(range(min = 1, message = "course_unit_id must be positive"))]
    pub course_unit_id: i64,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub is_test: bool,
}

pub async fn get_shared_code(
    State(state): State<AppState>,
    Json(payload): Json<SharedCodePayload>,
) -> AppResult<impl IntoResponse> {
    validate_payload(&payload)?;
    let code = enroll_codes::get_code(
        state.store.as_ref(),
        payload.course_unit_id,
        payload.is_preview,
        payload.is_test,
    )
    .await?;
    Ok((StatusCode::OK, Json(code)))
}

fn default_live() -> bool {
    true
}

#[derive(Deserialize, Validate)]
pub struct UserChatCodePayload {
    #[validate(range(min = 1, message = "course_unit_id must be positive"))]
    pub course_unit_id: i64,
    #[serde(default = "default_live")]
    pub is_live: bool,
}

pub async fn create_user_chat_code(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UserChatCodePayload>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    validate_payload(&payload)?;
    let code = enroll_codes::get_code_for_user_chat(
        state.store.as_ref(),
        payload.course_unit_id,
        payload.is_live,
        user.user_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(code)))
}
