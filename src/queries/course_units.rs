use anyhow::anyhow;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::course_units::CourseUnit;

pub async fn get_course_unit(conn: &mut PgConnection, id: i64) -> AppResult<Option<CourseUnit>> {
    sqlx::query_as::<_, CourseUnit>("SELECT * FROM course_units WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "get_course_unit failed");
            AppError::InternalServerError(anyhow!("Database error fetching course unit"))
        })
}

pub async fn get_chat_course_unit(
    conn: &mut PgConnection,
    chat_id: Uuid,
) -> AppResult<Option<CourseUnit>> {
    sqlx::query_as::<_, CourseUnit>(
        r#"
        SELECT cu.* FROM course_units cu
        JOIN enroll_unit_codes euc ON euc.course_unit_id = cu.id
        JOIN chats c ON c.enroll_code_id = euc.id
        WHERE c.id = $1
        "#,
    )
    .bind(chat_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "get_chat_course_unit failed");
        AppError::InternalServerError(anyhow!("Database error fetching course unit"))
    })
}
