use anyhow::anyhow;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::enroll_codes::{EnrollUnitCode, NewEnrollUnitCode};

pub async fn insert_enroll_code(
    conn: &mut PgConnection,
    new: NewEnrollUnitCode,
) -> AppResult<EnrollUnitCode> {
    let result = sqlx::query_as::<_, EnrollUnitCode>(
        r#"
        INSERT INTO enroll_unit_codes (id, enroll_code, course_unit_id, is_live, is_preview, is_test)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.enroll_code)
    .bind(new.course_unit_id)
    .bind(new.is_live)
    .bind(new.is_preview)
    .bind(new.is_test)
    .fetch_one(conn)
    .await;

    match result {
        Ok(code) => Ok(code),
        Err(e) => {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("enroll_unit_codes_code_unit_live_key")
                {
                    return Err(AppError::Conflict(anyhow!(
                        "Enroll code already exists for this course unit"
                    )));
                }
                if db_err.is_foreign_key_violation() {
                    return Err(AppError::NotFound(anyhow!(
                        "Course unit {} not found",
                        new.course_unit_id
                    )));
                }
            }
            tracing::error!(error = ?e, "enroll code insert failed");
            Err(AppError::InternalServerError(anyhow!(
                "Failed to create enroll code"
            )))
        }
    }
}

/// Serializes shared-code creation for one course unit until the
/// surrounding transaction ends.
pub async fn lock_shared_codes(conn: &mut PgConnection, course_unit_id: i64) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(course_unit_id)
        .execute(conn)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "lock_shared_codes failed");
            AppError::InternalServerError(anyhow!("Database error locking enroll codes"))
        })?;
    Ok(())
}

pub async fn find_shared_enroll_code(
    conn: &mut PgConnection,
    course_unit_id: i64,
    is_preview: bool,
    is_test: bool,
) -> AppResult<Option<EnrollUnitCode>> {
    sqlx::query_as::<_, EnrollUnitCode>(
        r#"
        SELECT * FROM enroll_unit_codes
        WHERE course_unit_id = $1 AND is_live = FALSE AND is_preview = $2 AND is_test = $3
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(course_unit_id)
    .bind(is_preview)
    .bind(is_test)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "find_shared_enroll_code failed");
        AppError::InternalServerError(anyhow!("Database error fetching enroll code"))
    })
}

pub async fn get_enroll_code_by_code(
    conn: &mut PgConnection,
    enroll_code: &str,
) -> AppResult<Option<EnrollUnitCode>> {
    sqlx::query_as::<_, EnrollUnitCode>(
        "SELECT * FROM enroll_unit_codes WHERE enroll_code = $1 ORDER BY created_at ASC LIMIT 1",
    )
    .bind(enroll_code)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "get_enroll_code_by_code failed");
        AppError::InternalServerError(anyhow!("Database error fetching enroll code"))
    })
}
