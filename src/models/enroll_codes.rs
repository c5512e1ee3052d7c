use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/*
id UUID PRIMARY KEY,
enroll_code VARCHAR(32) NOT NULL,
course_unit_id BIGINT NOT NULL REFERENCES course_units(id) ON DELETE CASCADE,
is_live BOOLEAN NOT NULL DEFAULT FALSE,
is_preview BOOLEAN NOT NULL DEFAULT FALSE,
is_test BOOLEAN NOT NULL DEFAULT FALSE,
created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
UNIQUE (enroll_code, course_unit_id, is_live)
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrollUnitCode {
    pub id: Uuid,
    pub enroll_code: String,
    pub course_unit_id: i64,
    pub is_live: bool,
    pub is_preview: bool,
    pub is_test: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEnrollUnitCode {
    pub enroll_code: String,
    pub course_unit_id: i64,
    pub is_live: bool,
    pub is_preview: bool,
    pub is_test: bool,
}

impl NewEnrollUnitCode {
    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> EnrollUnitCode {
        EnrollUnitCode {
            id,
            enroll_code: self.enroll_code,
            course_unit_id: self.course_unit_id,
            is_live: self.is_live,
            is_preview: self.is_preview,
            is_test: self.is_test,
            created_at,
        }
    }
}

/// A fresh enrollment token: 32 lowercase hex characters.
pub fn enroll_generator() -> String {
    Uuid::new_v4().simple().to_string()
}
