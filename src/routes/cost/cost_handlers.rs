use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::cost_models::{CreateCostRequest, UpdateCostRequest};
use crate::auth::session_user;
use crate::db::cost;
use crate::errors::ApiError;
use crate::routes::common_models::DefaultResponse;

fn duplicate_name(name: &str) -> String {
    format!("Cost with name '{}' already exists", name)
}

pub async fn create_cost(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<CreateCostRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create cost: {}", req.name);
    req.validate()?;

    let created = cost::create_cost(&pool, caller.tenant_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(&req.name)))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_costs(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to list costs of tenant {}", caller.tenant_id);
    Ok(HttpResponse::Ok().json(cost::get_all_costs(&pool, caller.tenant_id).await?))
}

pub async fn get_cost(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get cost {}", id);
    let found = cost::get_cost(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cost", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_cost(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateCostRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update cost {}", id);
    req.validate()?;

    let updated = cost::update_cost(&pool, caller.tenant_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(req.name.as_deref().unwrap_or_default())))?
        .ok_or_else(|| ApiError::not_found("Cost", id))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_cost(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete cost {}", id);

    if !cost::delete_cost(&pool, caller.tenant_id, id).await? {
        return Err(ApiError::not_found("Cost", id));
    }
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted cost {}", id))))
}
