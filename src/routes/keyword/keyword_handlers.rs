use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::keyword_models::{CreateKeywordRequest, UpdateKeywordRequest};
use crate::auth::session_user;
use crate::db::keyword;
use crate::errors::ApiError;
use crate::routes::common_models::DefaultResponse;

fn duplicate_name(name: &str) -> String {
    format!("Keyword with name '{}' already exists", name)
}

pub async fn create_keyword(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<CreateKeywordRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create keyword: {}", req.name);
    req.validate()?;

    let name = req.name.trim();
    let created = keyword::create_keyword(&pool, caller.tenant_id, name)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(name)))?
        .ok_or_else(|| ApiError::Conflict(duplicate_name(name)))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_keywords(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to list keywords of tenant {}", caller.tenant_id);
    Ok(HttpResponse::Ok().json(keyword::get_all_keywords(&pool, caller.tenant_id).await?))
}

pub async fn get_keyword(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get keyword {}", id);
    let found = keyword::get_keyword(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Keyword", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_keyword(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateKeywordRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update keyword {}", id);
    req.validate()?;

    let name = req.name.as_deref().map(str::trim);
    let updated = keyword::update_keyword(&pool, caller.tenant_id, id, name)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(name.unwrap_or_default())))?
        .ok_or_else(|| ApiError::not_found("Keyword", id))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_keyword(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete keyword {}", id);

    if !keyword::delete_keyword(&pool, caller.tenant_id, id).await? {
        return Err(ApiError::not_found("Keyword", id));
    }
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted keyword {}", id))))
}
