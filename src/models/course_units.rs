use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read-only view of a course unit owned by the course content service.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseUnit {
    pub id: i64,
    pub title: String,
    /// Number of lessons a learner has to answer to finish the unit.
    pub lesson_count: i32,
    /// Last time the instructor changed the unit's content.
    pub content_updated_at: Option<DateTime<Utc>>,
}
