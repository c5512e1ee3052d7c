use std::sync::Arc;

use crate::store::Store;
use crate::tasks::queue::TaskQueue;
use crate::websocket::manager::WebSocketManager;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tasks: TaskQueue,
    pub websocket_manager: WebSocketManager,
}
