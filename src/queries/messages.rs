use anyhow::anyhow;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::messages::{Message, MessageAdminRow};

const MESSAGE_COLUMNS: &str = "id, chat_id, owner_id, kind, input_type, message_type, text, \
     options, sub_kind, content_type, content_id, lesson_to_answer_id, response_to_check_id, \
     student_error_id, is_additional, timestamp";

pub async fn insert_message(conn: &mut PgConnection, message: &Message) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, chat_id, owner_id, kind, input_type, message_type, text,
            options, sub_kind, content_type, content_id, lesson_to_answer_id,
            response_to_check_id, student_error_id, is_additional, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(message.id)
    .bind(message.chat_id)
    .bind(message.owner_id)
    .bind(message.kind)
    .bind(message.input_type)
    .bind(message.message_type)
    .bind(&message.text)
    .bind(message.options)
    .bind(message.sub_kind)
    .bind(message.content_type)
    .bind(message.content_id)
    .bind(message.lesson_to_answer_id)
    .bind(message.response_to_check_id)
    .bind(message.student_error_id)
    .bind(message.is_additional)
    .bind(message.timestamp)
    .execute(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "message insert failed");
        AppError::InternalServerError(anyhow!("Failed to store message"))
    })?;
    Ok(())
}

pub async fn get_message(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Message>> {
    let sql = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
    sqlx::query_as::<_, Message>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "get_message failed");
            AppError::InternalServerError(anyhow!("Database error fetching message"))
        })
}

pub async fn list_chat_messages(conn: &mut PgConnection, chat_id: Uuid) -> AppResult<Vec<Message>> {
    let sql = format!(
        "SELECT {} FROM messages WHERE chat_id = $1 ORDER BY timestamp ASC, seq ASC",
        MESSAGE_COLUMNS
    );
    sqlx::query_as::<_, Message>(&sql)
        .bind(chat_id)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "list_chat_messages failed");
            AppError::InternalServerError(anyhow!("Database error listing messages"))
        })
}

pub async fn list_admin_messages(
    conn: &mut PgConnection,
    limit: i64,
) -> AppResult<Vec<MessageAdminRow>> {
    sqlx::query_as::<_, MessageAdminRow>(
        r#"
        SELECT m.id, m.kind, m.message_type, m.owner_id, m.text, m.timestamp,
               c.id AS chat_id, c.state AS chat_state
        FROM messages m
        LEFT JOIN chats c ON c.id = m.chat_id
        ORDER BY m.seq DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "list_admin_messages failed");
        AppError::InternalServerError(anyhow!("Database error listing messages"))
    })
}
