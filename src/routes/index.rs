use crate::app_state::AppState;
use crate::handlers::health;
use axum::{routing::get, Router};

pub fn index_route() -> Router<AppState> {
    Router::new().route("/", get(health))
}
