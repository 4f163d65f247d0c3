use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::user_watching_models::{UpdateUserWatchingRequest, UserWatchingResponse};
use crate::auth::session_user;
use crate::db::user_watching;
use crate::errors::ApiError;
use crate::routes::common_models::require_project;

pub async fn get_user_watching(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let project_id = path.into_inner();
    info!("Received request for user {} watching project {}", caller.user_id, project_id);

    require_project(&pool, caller.tenant_id, project_id).await?;
    let row = user_watching::get_user_watching(&pool, project_id, caller.user_id).await?;
    Ok(HttpResponse::Ok().json(UserWatchingResponse::new(project_id, row.as_ref())))
}

pub async fn update_user_watching(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateUserWatchingRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let project_id = path.into_inner();
    info!("Received request to update user {} watching project {}", caller.user_id, project_id);

    require_project(&pool, caller.tenant_id, project_id).await?;
    let row = user_watching::upsert_user_watching(&pool, project_id, caller.user_id, &req).await?;
    Ok(HttpResponse::Ok().json(UserWatchingResponse::new(project_id, Some(&row))))
}
