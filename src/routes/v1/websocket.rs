use crate::websocket::handlers::websocket_handler;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::get;
use axum::{middleware, Router};

pub fn websocket_routes() -> Router<AppState> {
    // /ws?chat_id=... follows one live chat
    Router::new()
        .route("/ws", get(websocket_handler))
        .layer(middleware::from_fn(auth_middleware))
}
