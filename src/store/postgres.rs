use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use uuid::Uuid;

use super::{Store, UpdateCandidate};
use crate::error::{AppError, AppResult};
use crate::models::{
    chats::{Chat, NewChat},
    course_units::CourseUnit,
    enroll_codes::{EnrollUnitCode, NewEnrollUnitCode},
    lti::GradedLaunch,
    messages::{Message, MessageAdminRow, NewMessage},
};
use crate::queries;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> AppResult<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(|e| {
            tracing::error!(error = ?e, "failed to acquire database connection");
            AppError::ServiceUnavailable(anyhow!("Failed to get connection"))
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_enroll_code(&self, new: NewEnrollUnitCode) -> AppResult<EnrollUnitCode> {
        let mut conn = self.conn().await?;
        queries::enroll_codes::insert_enroll_code(&mut conn, new).await
    }

    async fn find_shared_enroll_code(
        &self,
        course_unit_id: i64,
        is_preview: bool,
        is_test: bool,
    ) -> AppResult<Option<EnrollUnitCode>> {
        let mut conn = self.conn().await?;
        queries::enroll_codes::find_shared_enroll_code(&mut conn, course_unit_id, is_preview, is_test)
            .await
    }

    async fn get_or_insert_shared_enroll_code(
        &self,
        new: NewEnrollUnitCode,
    ) -> AppResult<EnrollUnitCode> {
        let mut tx = self.pool.begin().await.map_err(|_| {
            AppError::InternalServerError(anyhow!("Failed to start transaction"))
        })?;

        queries::enroll_codes::lock_shared_codes(&mut tx, new.course_unit_id).await?;
        let existing = queries::enroll_codes::find_shared_enroll_code(
            &mut tx,
            new.course_unit_id,
            new.is_preview,
            new.is_test,
        )
        .await?;
        let code = match existing {
            Some(code) => code,
            None => queries::enroll_codes::insert_enroll_code(&mut tx, new).await?,
        };

        tx.commit().await.map_err(|_| {
            AppError::InternalServerError(anyhow!("Failed to commit transaction"))
        })?;
        Ok(code)
    }

    async fn get_enroll_code_by_code(
        &self,
        enroll_code: &str,
    ) -> AppResult<Option<EnrollUnitCode>> {
        let mut conn = self.conn().await?;
        queries::enroll_codes::get_enroll_code_by_code(&mut conn, enroll_code).await
    }

    async fn get_course_unit(&self, id: i64) -> AppResult<Option<CourseUnit>> {
        let mut conn = self.conn().await?;
        queries::course_units::get_course_unit(&mut conn, id).await
    }

    async fn get_chat_course_unit(&self, chat_id: Uuid) -> AppResult<Option<CourseUnit>> {
        let mut conn = self.conn().await?;
        queries::course_units::get_chat_course_unit(&mut conn, chat_id).await
    }

    async fn insert_chat(&self, new: NewChat) -> AppResult<Chat> {
        let mut conn = self.conn().await?;
        queries::chats::insert_chat(&mut conn, Uuid::new_v4(), new).await
    }

    async fn get_chat(&self, id: Uuid) -> AppResult<Option<Chat>> {
        let mut conn = self.conn().await?;
        queries::chats::get_chat(&mut conn, id).await
    }

    async fn update_chat_progress(&self, id: Uuid, progress: i32) -> AppResult<Chat> {
        let mut conn = self.conn().await?;
        queries::chats::update_chat_progress(&mut conn, id, progress).await
    }

    async fn raise_chat_progress(&self, id: Uuid, progress: i32) -> AppResult<Chat> {
        let mut conn = self.conn().await?;
        queries::chats::raise_chat_progress(&mut conn, id, progress).await
    }

    async fn update_chat_state(&self, id: Uuid, state: Option<String>) -> AppResult<Chat> {
        let mut conn = self.conn().await?;
        queries::chats::update_chat_state(&mut conn, id, state).await
    }

    async fn delete_chat(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = self.conn().await?;
        queries::chats::delete_chat(&mut conn, id).await
    }

    async fn insert_message(&self, new: NewMessage) -> AppResult<Message> {
        let mut tx = self.pool.begin().await.map_err(|_| {
            AppError::InternalServerError(anyhow!("Failed to start transaction"))
        })?;

        if queries::chats::get_chat(&mut tx, new.chat_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow!("Chat {} not found", new.chat_id)));
        }

        // postgres keeps microseconds
        let now = Utc::now().trunc_subsecs(6);
        let chat_id = new.chat_id;
        let message = new.into_record(Uuid::new_v4(), now);
        queries::messages::insert_message(&mut tx, &message).await?;
        queries::chats::touch_chat(&mut tx, chat_id, now).await?;

        tx.commit().await.map_err(|_| {
            AppError::InternalServerError(anyhow!("Failed to commit transaction"))
        })?;
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> AppResult<Option<Message>> {
        let mut conn = self.conn().await?;
        queries::messages::get_message(&mut conn, id).await
    }

    async fn list_chat_messages(&self, chat_id: Uuid) -> AppResult<Vec<Message>> {
        let mut conn = self.conn().await?;
        queries::messages::list_chat_messages(&mut conn, chat_id).await
    }

    async fn list_admin_messages(&self, limit: i64) -> AppResult<Vec<MessageAdminRow>> {
        let mut conn = self.conn().await?;
        queries::messages::list_admin_messages(&mut conn, limit).await
    }

    async fn list_update_candidates(&self) -> AppResult<Vec<UpdateCandidate>> {
        let mut conn = self.conn().await?;
        queries::chats::list_update_candidates(&mut conn).await
    }

    async fn mark_chat_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn().await?;
        queries::chats::mark_chat_notified(&mut conn, id, at).await
    }

    async fn get_graded_launch(&self, id: i64) -> AppResult<Option<GradedLaunch>> {
        let mut conn = self.conn().await?;
        queries::lti::get_graded_launch(&mut conn, id).await
    }
}
