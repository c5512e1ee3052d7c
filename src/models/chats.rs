use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enroll_codes::EnrollUnitCode;

/// FSM node name of a finished conversation.
pub const DONE_STATE: &str = "DONE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub enroll_code_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    /// Current node of the tutoring FSM, driven by the external grader.
    pub state: Option<String>,
    pub next_point_id: Option<Uuid>,
    pub is_live: bool,
    pub is_preview: bool,
    pub is_test: bool,
    pub is_trial: bool,
    pub progress: i32,
    pub timestamp: Option<DateTime<Utc>>,
    pub last_modify_timestamp: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Live,
    Preview,
    Test,
    Trial,
    Standard,
}

impl Chat {
    pub fn is_done(&self) -> bool {
        self.state.as_deref() == Some(DONE_STATE)
    }

    /// Preview and test chats belong to instructors checking their material.
    pub fn is_learner_chat(&self) -> bool {
        !self.is_preview && !self.is_test
    }

    pub fn mode(&self) -> ChatMode {
        if self.is_preview {
            ChatMode::Preview
        } else if self.is_test {
            ChatMode::Test
        } else if self.is_live {
            ChatMode::Live
        } else if self.is_trial {
            ChatMode::Trial
        } else {
            ChatMode::Standard
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChat {
    pub user_id: Uuid,
    pub enroll_code_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    pub is_live: bool,
    pub is_preview: bool,
    pub is_test: bool,
    pub is_trial: bool,
}

impl NewChat {
    /// A chat inherits its mode flags from the code it was opened with.
    pub fn from_enroll_code(user_id: Uuid, code: &EnrollUnitCode, is_trial: bool) -> Self {
        Self {
            user_id,
            enroll_code_id: Some(code.id),
            instructor_id: None,
            is_live: code.is_live,
            is_preview: code.is_preview,
            is_test: code.is_test,
            is_trial,
        }
    }

    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> Chat {
        Chat {
            id,
            user_id: self.user_id,
            enroll_code_id: self.enroll_code_id,
            instructor_id: self.instructor_id,
            state: None,
            next_point_id: None,
            is_live: self.is_live,
            is_preview: self.is_preview,
            is_test: self.is_test,
            is_trial: self.is_trial,
            progress: 0,
            timestamp: Some(now),
            last_modify_timestamp: now,
            notified_at: None,
        }
    }
}
