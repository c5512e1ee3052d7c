use anyhow::anyhow;
use sqlx::PgConnection;

use crate::error::{AppError, AppResult};
use crate::models::lti::GradedLaunch;

pub async fn get_graded_launch(conn: &mut PgConnection, id: i64) -> AppResult<Option<GradedLaunch>> {
    sqlx::query_as::<_, GradedLaunch>("SELECT * FROM graded_launches WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "get_graded_launch failed");
            AppError::InternalServerError(anyhow!("Database error fetching graded launch"))
        })
}
