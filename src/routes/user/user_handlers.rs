use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt::{hash, DEFAULT_COST};
use log::{error, info};
use sqlx::MySqlPool;

use super::user_models::{CreateTenantRequest, CreateUserRequest};
use crate::auth::session_user;
use crate::db::{tenant, user, user::NewUser};
use crate::errors::ApiError;

fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::Internal("Failed to hash password".into())
    })
}

fn new_user<'a>(req: &'a CreateUserRequest, password_hash: &'a str) -> NewUser<'a> {
    NewUser {
        email: req.email.trim(),
        password_hash,
        first_name: req.first_name.as_deref(),
        last_name: req.last_name.as_deref(),
        phone_no: req.phone_no.as_deref(),
    }
}

pub async fn create_tenant(
    pool: web::Data<MySqlPool>,
    req: web::Json<CreateTenantRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Received request to create tenant: {}", req.name);
    req.validate()?;

    let password_hash = hash_password(&req.admin.password)?;
    let (tenant, admin) = tenant::create_tenant_with_admin(&pool, req.name.trim(), new_user(&req.admin, &password_hash))
        .await
        .map_err(|e| ApiError::from_write(e, || format!("User with email '{}' already exists", req.admin.email)))?;

    info!("Tenant {} created with admin {}", tenant.id, admin.id);
    Ok(HttpResponse::Created().json(serde_json::json!({ "tenant": tenant, "user": admin })))
}

pub async fn create_user(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create user: {}", req.email);
    req.validate()?;

    let password_hash = hash_password(&req.password)?;
    let created = user::create_user(&pool, caller.tenant_id, &new_user(&req, &password_hash))
        .await
        .map_err(|e| ApiError::from_write(e, || format!("User with email '{}' already exists", req.email)))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_users(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to list users of tenant {}", caller.tenant_id);
    let users = user::get_all_users(&pool, caller.tenant_id).await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get user {}", id);
    let found = user::get_user(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;
    Ok(HttpResponse::Ok().json(found))
}
