use crate::handlers::v1::messages;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::get;
use axum::{middleware, Router};

pub fn messages_routes() -> Router<AppState> {
    Router::new()
        .route("/{message_id}/html", get(messages::message_html))
        .layer(middleware::from_fn(auth_middleware))
}
