use crate::models::messages::{FollowUp, MessageKind};
use uuid::Uuid;

/// Events pushed to subscribers of a live chat.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    #[serde(rename = "message_added")]
    MessageAdded {
        chat_id: Uuid,
        message_id: Uuid,
        kind: MessageKind,
        follow_up: FollowUp,
        html: String,
        timestamp: Option<chrono::DateTime<chrono::Utc>>,
    },
    #[serde(rename = "progress_changed")]
    ProgressChanged { chat_id: Uuid, progress: i32 },
    #[serde(rename = "state_changed")]
    StateChanged {
        chat_id: Uuid,
        state: Option<String>,
    },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,
}

#[derive(Debug, Clone)]
pub struct UserConnection {
    pub user_id: Uuid,
    pub sender: tokio::sync::mpsc::UnboundedSender<WebSocketMessage>,
}

#[derive(Debug, Clone)]
pub struct ChatRoom {
    pub chat_id: Uuid,
    pub connections: std::sync::Arc<dashmap::DashMap<Uuid, UserConnection>>,
}
