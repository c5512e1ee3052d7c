use crate::handlers::v1::{chats, messages};
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::{get, post, put};
use axum::{middleware, Router};

pub fn chats_routes() -> Router<AppState> {
    // Protected routes that require authentication
    Router::new()
        .route("/", post(chats::start_chat))
        .route("/{chat_id}", get(chats::get_chat).delete(chats::delete_chat))
        .route("/{chat_id}/progress", put(chats::set_progress))
        .route("/{chat_id}/state", put(chats::set_state))
        .route(
            "/{chat_id}/messages",
            get(messages::list_messages).post(messages::append_message),
        )
        .layer(middleware::from_fn(auth_middleware))
}
