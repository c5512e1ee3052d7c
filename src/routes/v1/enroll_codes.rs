use crate::handlers::v1::enroll_codes;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::post;
use axum::{middleware, Router};

pub fn enroll_codes_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(enroll_codes::get_shared_code))
        .route("/live", post(enroll_codes::create_user_chat_code))
        .layer(middleware::from_fn(auth_middleware))
}
