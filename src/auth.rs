use actix_web::HttpRequest;
use log::info;
use sqlx::MySqlPool;

use crate::db::session::find_session_user;
use crate::errors::ApiError;
use crate::models::session::SessionUser;

pub const SESSION_COOKIE: &str = "session_id";

/// Resolves the caller from the `session_id` cookie. Missing, unknown and
/// expired sessions are all rejected with 401.
pub async fn session_user(pool: &MySqlPool, req: &HttpRequest) -> Result<SessionUser, ApiError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        info!("Session ID not found in cookies for {}", req.path());
        return Err(ApiError::Unauthorized("Session ID not found in cookies".into()));
    };

    match find_session_user(pool, cookie.value()).await? {
        Some(user) => Ok(user),
        None => {
            info!("Invalid or expired session ID: {}", cookie.value());
            Err(ApiError::Unauthorized("Login is needed, session expired".into()))
        }
    }
}
