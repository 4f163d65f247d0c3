use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use crate::auth::session_user;
use crate::db::session::purge_expired_sessions;
use crate::errors::ApiError;
use crate::routes::common_models::DefaultResponse;

pub async fn purge_sessions(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request from user {} to purge expired sessions", caller.user_id);

    let purged = purge_expired_sessions(&pool).await?;
    info!("Purged {} expired sessions", purged);
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Removed {} expired sessions", purged))))
}
