use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tower_sessions::Session;

use crate::models::sessions::UserSession;

pub async fn auth_middleware(
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // the login layer stores the user under "user"
    match session.get::<UserSession>("user").await {
        Ok(Some(_user_session)) => Ok(next.run(req).await),
        Ok(None) => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
