use serde::Serialize;

/// An LTI launch that expects a grade back (LTI 1.1 Basic Outcomes).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GradedLaunch {
    pub id: i64,
    pub lis_outcome_service_url: String,
    pub lis_result_sourcedid: String,
    pub consumer_key: String,
    #[serde(skip_serializing)]
    pub consumer_secret: String,
}
