use anyhow::anyhow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::enroll_codes::{enroll_generator, EnrollUnitCode, NewEnrollUnitCode};
use crate::store::Store;

// the unique constraint can still fire on a freshly generated code
const MAX_CODE_ATTEMPTS: usize = 3;

async fn ensure_course_unit(store: &dyn Store, course_unit_id: i64) -> AppResult<()> {
    if store.get_course_unit(course_unit_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow!(
            "Course unit {} not found",
            course_unit_id
        )));
    }
    Ok(())
}

async fn mint(
    store: &dyn Store,
    course_unit_id: i64,
    is_live: bool,
    is_preview: bool,
    is_test: bool,
    shared: bool,
) -> AppResult<EnrollUnitCode> {
    let mut last_err = None;
    for _ in 0..MAX_CODE_ATTEMPTS {
        let new = NewEnrollUnitCode {
            enroll_code: enroll_generator(),
            course_unit_id,
            is_live,
            is_preview,
            is_test,
        };
        let inserted = if shared {
            store.get_or_insert_shared_enroll_code(new).await
        } else {
            store.insert_enroll_code(new).await
        };
        match inserted {
            Ok(code) => return Ok(code),
            Err(AppError::Conflict(e)) => {
                tracing::warn!(course_unit_id, error = %e, "enroll code collision, retrying");
                last_err = Some(AppError::Conflict(e));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        AppError::InternalServerError(anyhow!("Failed to create enroll code"))
    }))
}

/// The shared code of a course unit for the given mode, created on first use.
pub async fn get_code(
    store: &dyn Store,
    course_unit_id: i64,
    is_preview: bool,
    is_test: bool,
) -> AppResult<EnrollUnitCode> {
    ensure_course_unit(store, course_unit_id).await?;
    if let Some(code) = store
        .find_shared_enroll_code(course_unit_id, is_preview, is_test)
        .await?
    {
        return Ok(code);
    }
    let code = mint(store, course_unit_id, false, is_preview, is_test, true).await?;
    tracing::info!(course_unit_id, is_preview, is_test, "created shared enroll code");
    Ok(code)
}

/// A code of its own for one user's chat; every call mints a new one.
pub async fn get_code_for_user_chat(
    store: &dyn Store,
    course_unit_id: i64,
    is_live: bool,
    user_id: Uuid,
) -> AppResult<EnrollUnitCode> {
    ensure_course_unit(store, course_unit_id).await?;
    let code = mint(store, course_unit_id, is_live, false, false, false).await?;
    tracing::info!(course_unit_id, is_live, %user_id, "created user chat enroll code");
    Ok(code)
}
