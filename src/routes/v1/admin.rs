use crate::handlers::v1::admin;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::get;
use axum::{middleware, Router};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(admin::list_messages))
        .layer(middleware::from_fn(auth_middleware))
}
