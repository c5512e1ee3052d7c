use crate::handlers::v1::lti;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::post;
use axum::{middleware, Router};

pub fn lti_routes() -> Router<AppState> {
    Router::new()
        .route("/outcomes", post(lti::queue_outcome))
        .layer(middleware::from_fn(auth_middleware))
}
