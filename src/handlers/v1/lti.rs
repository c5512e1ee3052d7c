use anyhow::anyhow;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{extract::State, Json};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::{session_user, v1::validate_payload};
use crate::tasks::queue::Job;
use crate::{app_state::AppState, error::AppResult};

#[derive(Deserialize, Validate)]
pub struct OutcomePayload {
    #[validate(range(min = 0.0, max = 1.0, message = "score must be between 0 and 1"))]
    pub score: f64,
    #[validate(range(min = 1, message = "assignment_id must be positive"))]
    pub assignment_id: i64,
}

/// Queues a grade passback; the post itself happens in the background.
pub async fn queue_outcome(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<OutcomePayload>,
) -> AppResult<impl IntoResponse> {
    let user = session_user(&session).await?;
    if !user.is_staff {
        return Err(AppError::Forbidden(anyhow!("Staff only")));
    }
    validate_payload(&payload)?;

    state.tasks.enqueue(Job::SendOutcome {
        score: payload.score,
        assignment_id: payload.assignment_id,
    });
    Ok((StatusCode::ACCEPTED, "Outcome queued"))
}
