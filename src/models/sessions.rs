use serde::{Deserialize, Serialize};

/// Session payload stored under the `"user"` key by the login layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: uuid::Uuid,
    #[serde(default)]
    pub is_staff: bool,
}
