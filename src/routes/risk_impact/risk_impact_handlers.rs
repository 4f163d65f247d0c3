use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::risk_impact_models::{CreateRiskImpactRequest, UpdateRiskImpactRequest};
use crate::auth::session_user;
use crate::db::risk_impact;
use crate::errors::ApiError;
use crate::routes::common_models::DefaultResponse;

fn duplicate_name(name: &str) -> String {
    format!("Risk impact with name '{}' already exists", name)
}

pub async fn create_risk_impact(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<CreateRiskImpactRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create risk impact: {}", req.name);
    req.validate()?;

    let created = risk_impact::create_risk_impact(&pool, caller.tenant_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(&req.name)))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_risk_impacts(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to list risk impacts of tenant {}", caller.tenant_id);
    Ok(HttpResponse::Ok().json(risk_impact::get_all_risk_impacts(&pool, caller.tenant_id).await?))
}

pub async fn get_risk_impact(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get risk impact {}", id);
    let found = risk_impact::get_risk_impact(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Risk impact", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_risk_impact(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateRiskImpactRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update risk impact {}", id);
    req.validate()?;

    let updated = risk_impact::update_risk_impact(&pool, caller.tenant_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(req.name.as_deref().unwrap_or_default())))?
        .ok_or_else(|| ApiError::not_found("Risk impact", id))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_risk_impact(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete risk impact {}", id);

    if !risk_impact::delete_risk_impact(&pool, caller.tenant_id, id).await? {
        return Err(ApiError::not_found("Risk impact", id));
    }
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted risk impact {}", id))))
}
