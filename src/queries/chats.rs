use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::chats::{Chat, NewChat};
use crate::models::course_units::CourseUnit;
use crate::store::UpdateCandidate;

pub async fn insert_chat(conn: &mut PgConnection, id: Uuid, new: NewChat) -> AppResult<Chat> {
    sqlx::query_as::<_, Chat>(
        r#"
        INSERT INTO chats (id, user_id, enroll_code_id, instructor_id, is_live, is_preview, is_test, is_trial)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(new.user_id)
    .bind(new.enroll_code_id)
    .bind(new.instructor_id)
    .bind(new.is_live)
    .bind(new.is_preview)
    .bind(new.is_test)
    .bind(new.is_trial)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "chat insert failed");
        AppError::InternalServerError(anyhow!("Failed to create chat"))
    })
}

pub async fn get_chat(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Chat>> {
    sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "get_chat failed");
            AppError::InternalServerError(anyhow!("Database error fetching chat"))
        })
}

pub async fn update_chat_progress(
    conn: &mut PgConnection,
    id: Uuid,
    progress: i32,
) -> AppResult<Chat> {
    sqlx::query_as::<_, Chat>(
        "UPDATE chats SET progress = $1, last_modify_timestamp = now() WHERE id = $2 RETURNING *",
    )
    .bind(progress)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "update_chat_progress failed");
        AppError::InternalServerError(anyhow!("Failed to update chat progress"))
    })?
    .ok_or_else(|| AppError::NotFound(anyhow!("Chat {} not found", id)))
}

pub async fn raise_chat_progress(
    conn: &mut PgConnection,
    id: Uuid,
    progress: i32,
) -> AppResult<Chat> {
    sqlx::query_as::<_, Chat>(
        r#"
        UPDATE chats
        SET progress = GREATEST(progress, $1), last_modify_timestamp = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(progress)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "raise_chat_progress failed");
        AppError::InternalServerError(anyhow!("Failed to update chat progress"))
    })?
    .ok_or_else(|| AppError::NotFound(anyhow!("Chat {} not found", id)))
}

pub async fn update_chat_state(
    conn: &mut PgConnection,
    id: Uuid,
    state: Option<String>,
) -> AppResult<Chat> {
    sqlx::query_as::<_, Chat>(
        "UPDATE chats SET state = $1, last_modify_timestamp = now() WHERE id = $2 RETURNING *",
    )
    .bind(state)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "update_chat_state failed");
        AppError::InternalServerError(anyhow!("Failed to update chat state"))
    })?
    .ok_or_else(|| AppError::NotFound(anyhow!("Chat {} not found", id)))
}

pub async fn touch_chat(conn: &mut PgConnection, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
    sqlx::query("UPDATE chats SET last_modify_timestamp = $1 WHERE id = $2")
        .bind(at)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "touch_chat failed");
            AppError::InternalServerError(anyhow!("Failed to update chat"))
        })?;
    Ok(())
}

/// Messages keep their rows; `ON DELETE SET NULL` detaches them.
pub async fn delete_chat(conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM chats WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "delete_chat failed");
            AppError::InternalServerError(anyhow!("Failed to delete chat"))
        })?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_chat_notified(
    conn: &mut PgConnection,
    id: Uuid,
    at: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query("UPDATE chats SET notified_at = $1 WHERE id = $2")
        .bind(at)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "mark_chat_notified failed");
            AppError::InternalServerError(anyhow!("Failed to mark chat notified"))
        })?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    chat: Chat,
    unit_id: i64,
    unit_title: String,
    unit_lesson_count: i32,
    unit_content_updated_at: Option<DateTime<Utc>>,
    email: String,
}

pub async fn list_update_candidates(conn: &mut PgConnection) -> AppResult<Vec<UpdateCandidate>> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT c.*,
               cu.id AS unit_id,
               cu.title AS unit_title,
               cu.lesson_count AS unit_lesson_count,
               cu.content_updated_at AS unit_content_updated_at,
               u.email
        FROM chats c
        JOIN enroll_unit_codes euc ON euc.id = c.enroll_code_id
        JOIN course_units cu ON cu.id = euc.course_unit_id
        JOIN users u ON u.id = c.user_id
        WHERE c.is_preview = FALSE
          AND c.is_test = FALSE
          AND cu.content_updated_at IS NOT NULL
        "#,
    )
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "list_update_candidates failed");
        AppError::InternalServerError(anyhow!("Database error listing chats"))
    })?;

    Ok(rows
        .into_iter()
        .map(|row| UpdateCandidate {
            chat: row.chat,
            course_unit: CourseUnit {
                id: row.unit_id,
                title: row.unit_title,
                lesson_count: row.unit_lesson_count,
                content_updated_at: row.unit_content_updated_at,
            },
            email: row.email,
        })
        .collect())
}
