use actix_web::{cookie::Cookie, web, HttpRequest, HttpResponse};
use bcrypt::verify;
use log::{error, info};
use sqlx::MySqlPool;

use super::session_models::{LoginRequest, MeResponse};
use crate::auth::{session_user, SESSION_COOKIE};
use crate::db::{session, user};
use crate::errors::ApiError;
use crate::routes::common_models::DefaultResponse;

pub async fn session_get() -> HttpResponse {
    info!("Received request on /api-session endpoint");
    HttpResponse::Ok().body("Session endpoint")
}

pub async fn login(
    pool: web::Data<MySqlPool>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let email = req.email.trim();
    info!("Received login request for user: {}", email);

    let Some(user) = user::find_user_by_email(&pool, email).await? else {
        info!("Invalid email: {}", email);
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    };
    if !user.is_active {
        info!("Inactive user tried to log in: {}", email);
        return Err(ApiError::Unauthorized("User is not active".into()));
    }

    let valid = verify(&req.password, &user.password_hash).map_err(|e| {
        error!("Error when checking password for user {}: {}", email, e);
        ApiError::Unauthorized("Error when checking password".into())
    })?;
    if !valid {
        info!("Invalid password for user: {}", email);
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    }

    let session_id = session::create_session(&pool, user.id, req.remember_me).await?;

    info!("User {} logged in successfully", email);
    Ok(HttpResponse::Ok()
        .cookie(Cookie::build(SESSION_COOKIE, session_id).http_only(true).path("/").finish())
        .json(DefaultResponse::ok("Login successful")))
}

pub async fn logout(pool: web::Data<MySqlPool>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        info!("Session ID not found in cookies for logout");
        return Err(ApiError::BadRequest("Session ID not found in cookies".into()));
    };
    info!("Received logout request with session ID: {}", cookie.value());

    if !session::delete_session(&pool, cookie.value()).await? {
        return Err(ApiError::NotFound("Session not found".into()));
    }

    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();
    Ok(HttpResponse::Ok()
        .cookie(removal)
        .json(DefaultResponse::ok("Logout successful")))
}

pub async fn me(pool: web::Data<MySqlPool>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &req).await?;
    info!("Received request for current user {}", caller.user_id);

    let user = user::get_user(&pool, caller.tenant_id, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", caller.user_id))?;
    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: user.id,
        tenant_id: user.tenant_id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}
