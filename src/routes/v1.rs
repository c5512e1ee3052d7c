pub mod admin;
pub mod chats;
pub mod enroll_codes;
pub mod lti;
pub mod messages;
pub mod websocket;

use crate::app_state::AppState;
use axum::Router;

pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/enroll_codes", enroll_codes::enroll_codes_routes())
        .nest("/chats", chats::chats_routes())
        .nest("/messages", messages::messages_routes())
        .nest("/admin", admin::admin_routes())
        .nest("/lti", lti::lti_routes())
        .merge(websocket::websocket_routes())
}
