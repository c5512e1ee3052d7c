//! Persistence boundary.
//!
//! [`Store`] is what handlers, services and background jobs talk to.
//! [`postgres::PgStore`] is the production implementation on top of the
//! sqlx queries in [`crate::queries`]; [`memory::MemoryStore`] keeps
//! everything in process and backs the tests.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    chats::{Chat, NewChat},
    course_units::CourseUnit,
    enroll_codes::{EnrollUnitCode, NewEnrollUnitCode},
    lti::GradedLaunch,
    messages::{Message, MessageAdminRow, NewMessage},
};

/// A learner chat that may need an "updates available" email.
#[derive(Debug, Clone)]
pub struct UpdateCandidate {
    pub chat: Chat,
    pub course_unit: CourseUnit,
    pub email: String,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Fails with `AppError::Conflict` when the
    /// (enroll_code, course_unit_id, is_live) triple is taken.
    async fn insert_enroll_code(&self, new: NewEnrollUnitCode) -> AppResult<EnrollUnitCode>;

    /// The shared, non-live code of a course unit for the given mode.
    async fn find_shared_enroll_code(
        &self,
        course_unit_id: i64,
        is_preview: bool,
        is_test: bool,
    ) -> AppResult<Option<EnrollUnitCode>>;

    /// Returns the shared code matching `new`'s unit and mode, inserting
    /// `new` when there is none. Concurrent callers get the same code.
    async fn get_or_insert_shared_enroll_code(
        &self,
        new: NewEnrollUnitCode,
    ) -> AppResult<EnrollUnitCode>;

    async fn get_enroll_code_by_code(&self, enroll_code: &str)
        -> AppResult<Option<EnrollUnitCode>>;

    async fn get_course_unit(&self, id: i64) -> AppResult<Option<CourseUnit>>;

    /// Course unit a chat was opened for, through its enroll code.
    async fn get_chat_course_unit(&self, chat_id: Uuid) -> AppResult<Option<CourseUnit>>;

    async fn insert_chat(&self, new: NewChat) -> AppResult<Chat>;

    async fn get_chat(&self, id: Uuid) -> AppResult<Option<Chat>>;

    /// Also bumps `last_modify_timestamp`.
    async fn update_chat_progress(&self, id: Uuid, progress: i32) -> AppResult<Chat>;

    /// Sets progress to the larger of the stored and given values in one
    /// step. Also bumps `last_modify_timestamp`.
    async fn raise_chat_progress(&self, id: Uuid, progress: i32) -> AppResult<Chat>;

    /// Also bumps `last_modify_timestamp`.
    async fn update_chat_state(&self, id: Uuid, state: Option<String>) -> AppResult<Chat>;

    /// Deletes the chat and detaches its messages. Returns whether it existed.
    async fn delete_chat(&self, id: Uuid) -> AppResult<bool>;

    /// Appends to the chat and bumps its `last_modify_timestamp`.
    async fn insert_message(&self, new: NewMessage) -> AppResult<Message>;

    async fn get_message(&self, id: Uuid) -> AppResult<Option<Message>>;

    /// Messages in conversation order.
    async fn list_chat_messages(&self, chat_id: Uuid) -> AppResult<Vec<Message>>;

    /// Newest first.
    async fn list_admin_messages(&self, limit: i64) -> AppResult<Vec<MessageAdminRow>>;

    /// Learner chats (not preview, not test) whose course unit has a
    /// `content_updated_at`, joined with the owner's email.
    async fn list_update_candidates(&self) -> AppResult<Vec<UpdateCandidate>>;

    /// Does not touch `last_modify_timestamp`.
    async fn mark_chat_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    async fn get_graded_launch(&self, id: i64) -> AppResult<Option<GradedLaunch>>;
}
