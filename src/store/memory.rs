//! In-process [`Store`] used by the test suite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, UpdateCandidate};
use crate::error::{AppError, AppResult};
use crate::models::{
    chats::{Chat, NewChat},
    course_units::CourseUnit,
    enroll_codes::{EnrollUnitCode, NewEnrollUnitCode},
    lti::GradedLaunch,
    messages::{Message, MessageAdminRow, NewMessage},
    users::User,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    course_units: HashMap<i64, CourseUnit>,
    graded_launches: HashMap<i64, GradedLaunch>,
    enroll_codes: Vec<EnrollUnitCode>,
    chats: HashMap<Uuid, Chat>,
    // insertion order is conversation order
    messages: Vec<Message>,
}

impl Inner {
    fn insert_enroll_code(&mut self, new: NewEnrollUnitCode) -> AppResult<EnrollUnitCode> {
        let taken = self.enroll_codes.iter().any(|c| {
            c.enroll_code == new.enroll_code
                && c.course_unit_id == new.course_unit_id
                && c.is_live == new.is_live
        });
        if taken {
            return Err(AppError::Conflict(anyhow!(
                "Enroll code already exists for this course unit"
            )));
        }
        let code = new.into_record(Uuid::new_v4(), Utc::now());
        self.enroll_codes.push(code.clone());
        Ok(code)
    }

    fn find_shared_enroll_code(
        &self,
        course_unit_id: i64,
        is_preview: bool,
        is_test: bool,
    ) -> Option<&EnrollUnitCode> {
        self.enroll_codes.iter().find(|c| {
            c.course_unit_id == course_unit_id
                && !c.is_live
                && c.is_preview == is_preview
                && c.is_test == is_test
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    refuse_notified_marks: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }

    pub async fn add_course_unit(&self, unit: CourseUnit) {
        self.inner.write().await.course_units.insert(unit.id, unit);
    }

    pub async fn add_graded_launch(&self, launch: GradedLaunch) {
        self.inner
            .write()
            .await
            .graded_launches
            .insert(launch.id, launch);
    }

    /// Makes every later `mark_chat_notified` fail.
    pub fn refuse_notified_marks(&self) {
        self.refuse_notified_marks.store(true, Ordering::SeqCst);
    }

    /// Stands in for instructors editing a unit.
    pub async fn touch_course_unit(&self, id: i64, at: DateTime<Utc>) {
        if let Some(unit) = self.inner.write().await.course_units.get_mut(&id) {
            unit.content_updated_at = Some(at);
        }
    }
}

fn chat_not_found(id: Uuid) -> AppError {
    AppError::NotFound(anyhow!("Chat {} not found", id))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_enroll_code(&self, new: NewEnrollUnitCode) -> AppResult<EnrollUnitCode> {
        self.inner.write().await.insert_enroll_code(new)
    }

    async fn find_shared_enroll_code(
        &self,
        course_unit_id: i64,
        is_preview: bool,
        is_test: bool,
    ) -> AppResult<Option<EnrollUnitCode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .find_shared_enroll_code(course_unit_id, is_preview, is_test)
            .cloned())
    }

    async fn get_or_insert_shared_enroll_code(
        &self,
        new: NewEnrollUnitCode,
    ) -> AppResult<EnrollUnitCode> {
        let mut inner = self.inner.write().await;
        if let Some(code) =
            inner.find_shared_enroll_code(new.course_unit_id, new.is_preview, new.is_test)
        {
            return Ok(code.clone());
        }
        inner.insert_enroll_code(new)
    }

    async fn get_enroll_code_by_code(
        &self,
        enroll_code: &str,
    ) -> AppResult<Option<EnrollUnitCode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .enroll_codes
            .iter()
            .find(|c| c.enroll_code == enroll_code)
            .cloned())
    }

    async fn get_course_unit(&self, id: i64) -> AppResult<Option<CourseUnit>> {
        Ok(self.inner.read().await.course_units.get(&id).cloned())
    }

    async fn get_chat_course_unit(&self, chat_id: Uuid) -> AppResult<Option<CourseUnit>> {
        let inner = self.inner.read().await;
        let unit = inner
            .chats
            .get(&chat_id)
            .and_then(|chat| chat.enroll_code_id)
            .and_then(|code_id| inner.enroll_codes.iter().find(|c| c.id == code_id))
            .and_then(|code| inner.course_units.get(&code.course_unit_id))
            .cloned();
        Ok(unit)
    }

    async fn insert_chat(&self, new: NewChat) -> AppResult<Chat> {
        let chat = new.into_record(Uuid::new_v4(), Utc::now());
        self.inner.write().await.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn get_chat(&self, id: Uuid) -> AppResult<Option<Chat>> {
        Ok(self.inner.read().await.chats.get(&id).cloned())
    }

    async fn update_chat_progress(&self, id: Uuid, progress: i32) -> AppResult<Chat> {
        let mut inner = self.inner.write().await;
        let chat = inner.chats.get_mut(&id).ok_or_else(|| chat_not_found(id))?;
        chat.progress = progress;
        chat.last_modify_timestamp = Utc::now();
        Ok(chat.clone())
    }

    async fn raise_chat_progress(&self, id: Uuid, progress: i32) -> AppResult<Chat> {
        let mut inner = self.inner.write().await;
        let chat = inner.chats.get_mut(&id).ok_or_else(|| chat_not_found(id))?;
        chat.progress = chat.progress.max(progress);
        chat.last_modify_timestamp = Utc::now();
        Ok(chat.clone())
    }

    async fn update_chat_state(&self, id: Uuid, state: Option<String>) -> AppResult<Chat> {
        let mut inner = self.inner.write().await;
        let chat = inner.chats.get_mut(&id).ok_or_else(|| chat_not_found(id))?;
        chat.state = state;
        chat.last_modify_timestamp = Utc::now();
        Ok(chat.clone())
    }

    async fn delete_chat(&self, id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.chats.remove(&id).is_none() {
            return Ok(false);
        }
        for message in inner.messages.iter_mut() {
            if message.chat_id == Some(id) {
                message.chat_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_message(&self, new: NewMessage) -> AppResult<Message> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let chat = inner
            .chats
            .get_mut(&new.chat_id)
            .ok_or_else(|| chat_not_found(new.chat_id))?;
        chat.last_modify_timestamp = now;

        let message = new.into_record(Uuid::new_v4(), now);
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> AppResult<Option<Message>> {
        let inner = self.inner.read().await;
        Ok(inner.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_chat_messages(&self, chat_id: Uuid) -> AppResult<Vec<Message>> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.chat_id == Some(chat_id))
            .cloned()
            .collect())
    }

    async fn list_admin_messages(&self, limit: i64) -> AppResult<Vec<MessageAdminRow>> {
        let inner = self.inner.read().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(inner
            .messages
            .iter()
            .rev()
            .take(limit)
            .map(|m| {
                let chat = m.chat_id.and_then(|id| inner.chats.get(&id));
                MessageAdminRow {
                    id: m.id,
                    kind: m.kind,
                    message_type: m.message_type,
                    owner_id: m.owner_id,
                    text: m.text.clone(),
                    timestamp: m.timestamp,
                    chat_id: chat.map(|c| c.id),
                    chat_state: chat.and_then(|c| c.state.clone()),
                }
            })
            .collect())
    }

    async fn list_update_candidates(&self) -> AppResult<Vec<UpdateCandidate>> {
        let inner = self.inner.read().await;
        let mut candidates = Vec::new();
        for chat in inner.chats.values().filter(|c| c.is_learner_chat()) {
            let Some(code) = chat
                .enroll_code_id
                .and_then(|id| inner.enroll_codes.iter().find(|c| c.id == id))
            else {
                continue;
            };
            let Some(unit) = inner.course_units.get(&code.course_unit_id) else {
                continue;
            };
            if unit.content_updated_at.is_none() {
                continue;
            }
            let Some(user) = inner.users.get(&chat.user_id) else {
                continue;
            };
            candidates.push(UpdateCandidate {
                chat: chat.clone(),
                course_unit: unit.clone(),
                email: user.email.clone(),
            });
        }
        Ok(candidates)
    }

    async fn mark_chat_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if self.refuse_notified_marks.load(Ordering::SeqCst) {
            return Err(AppError::ServiceUnavailable(anyhow!("store is read-only")));
        }
        let mut inner = self.inner.write().await;
        let chat = inner.chats.get_mut(&id).ok_or_else(|| chat_not_found(id))?;
        chat.notified_at = Some(at);
        Ok(())
    }

    async fn get_graded_launch(&self, id: i64) -> AppResult<Option<GradedLaunch>> {
        Ok(self.inner.read().await.graded_launches.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::messages::MessageKind;

    fn code(enroll_code: &str, course_unit_id: i64, is_live: bool) -> NewEnrollUnitCode {
        NewEnrollUnitCode {
            enroll_code: enroll_code.to_string(),
            course_unit_id,
            is_live,
            is_preview: false,
            is_test: false,
        }
    }

    fn new_chat(user_id: Uuid) -> NewChat {
        NewChat {
            user_id,
            enroll_code_id: None,
            instructor_id: None,
            is_live: false,
            is_preview: false,
            is_test: false,
            is_trial: false,
        }
    }

    #[tokio::test]
    async fn duplicate_enroll_code_triple_is_rejected() {
        let store = MemoryStore::new();
        store.insert_enroll_code(code("abc", 1, false)).await.unwrap();

        let err = store.insert_enroll_code(code("abc", 1, false)).await;
        assert!(matches!(err, Err(AppError::Conflict(_))));

        // any differing component is a different code
        store.insert_enroll_code(code("abc", 1, true)).await.unwrap();
        store.insert_enroll_code(code("abc", 2, false)).await.unwrap();
        store.insert_enroll_code(code("abd", 1, false)).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_a_chat_keeps_its_messages() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let chat = store.insert_chat(new_chat(user)).await.unwrap();
        let message = store
            .insert_message(NewMessage::new(chat.id, user, MessageKind::Message))
            .await
            .unwrap();

        assert!(store.delete_chat(chat.id).await.unwrap());
        assert!(!store.delete_chat(chat.id).await.unwrap());

        let orphan = store.get_message(message.id).await.unwrap().unwrap();
        assert_eq!(orphan.chat_id, None);
        assert!(store.list_chat_messages(chat.id).await.unwrap().is_empty());

        let rows = store.list_admin_messages(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chat_id, None);
        assert_eq!(rows[0].chat_state, None);
    }

    #[tokio::test]
    async fn appending_bumps_last_modify_timestamp() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let chat = store.insert_chat(new_chat(user)).await.unwrap();

        let message = store
            .insert_message(NewMessage::new(chat.id, user, MessageKind::Orct))
            .await
            .unwrap();
        let reloaded = store.get_chat(chat.id).await.unwrap().unwrap();

        assert!(reloaded.last_modify_timestamp >= chat.last_modify_timestamp);
        assert_eq!(Some(reloaded.last_modify_timestamp), message.timestamp);
        assert_eq!(reloaded.timestamp, chat.timestamp);
    }

    #[tokio::test]
    async fn message_to_missing_chat_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .insert_message(NewMessage::new(Uuid::new_v4(), Uuid::new_v4(), MessageKind::Base))
            .await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn admin_rows_derive_chat_columns() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let chat = store.insert_chat(new_chat(user)).await.unwrap();
        store
            .update_chat_state(chat.id, Some("ASK".to_string()))
            .await
            .unwrap();
        store
            .insert_message(NewMessage::new(chat.id, user, MessageKind::Orct))
            .await
            .unwrap();
        store
            .insert_message(NewMessage::new(chat.id, user, MessageKind::Response))
            .await
            .unwrap();

        let rows = store.list_admin_messages(1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, MessageKind::Response);
        assert_eq!(rows[0].chat_id, Some(chat.id));
        assert_eq!(rows[0].chat_state.as_deref(), Some("ASK"));
    }
}
