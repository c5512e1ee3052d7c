use crate::models::websocket::{ChatRoom, UserConnection, WebSocketMessage};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct WebSocketManager {
    // Map of chat_id -> ChatRoom
    pub chat_rooms: Arc<DashMap<Uuid, ChatRoom>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one socket. `connection_id` is unique per socket, so a user
    /// may follow the same chat from several tabs.
    pub fn join_chat(
        &self,
        chat_id: Uuid,
        connection_id: Uuid,
        user_id: Uuid,
        sender: tokio::sync::mpsc::UnboundedSender<WebSocketMessage>,
    ) {
        let chat_room = self.chat_rooms.entry(chat_id).or_insert_with(|| ChatRoom {
            chat_id,
            connections: Arc::new(DashMap::new()),
        });
        chat_room
            .connections
            .insert(connection_id, UserConnection { user_id, sender });
        tracing::debug!(
            %user_id,
            %chat_id,
            %connection_id,
            watchers = chat_room.connections.len(),
            "joined live chat"
        );
    }

    pub fn leave_chat(&self, chat_id: Uuid, connection_id: Uuid) {
        let now_empty = match self.chat_rooms.get(&chat_id) {
            Some(chat_room) => {
                chat_room.connections.remove(&connection_id);
                chat_room.connections.is_empty()
            }
            None => false,
        };
        // the read guard must be gone before removing the room
        if now_empty {
            self.chat_rooms
                .remove_if(&chat_id, |_, room| room.connections.is_empty());
        }
        tracing::debug!(%chat_id, %connection_id, "left live chat");
    }

    pub fn broadcast_to_chat(&self, chat_id: Uuid, message: WebSocketMessage) {
        if let Some(chat_room) = self.chat_rooms.get(&chat_id) {
            let mut dead = Vec::new();
            for connection in chat_room.connections.iter() {
                if let Err(e) = connection.sender.send(message.clone()) {
                    tracing::warn!(
                        user_id = %connection.user_id,
                        connection_id = %connection.key(),
                        error = %e,
                        "dropping dead websocket"
                    );
                    dead.push(*connection.key());
                }
            }
            for connection_id in dead {
                chat_room.connections.remove(&connection_id);
            }
        }
    }

    pub fn connection_count(&self, chat_id: Uuid) -> usize {
        self.chat_rooms
            .get(&chat_id)
            .map_or(0, |room| room.connections.len())
    }
}
