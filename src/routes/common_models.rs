use serde::Serialize;
use sqlx::MySqlPool;

use crate::db::project::project_in_tenant;
use crate::db::user::user_in_tenant;
use crate::errors::ApiError;

#[derive(Serialize)]
pub struct DefaultResponse {
    pub success: bool,
    pub message: String,
}

impl DefaultResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        DefaultResponse {
            success: true,
            message: message.into(),
        }
    }
}

// Names must carry at least one visible character
pub fn require_name(entity: &str, name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} name must not be empty", entity)));
    }
    Ok(())
}

pub fn require_optional_name(entity: &str, name: Option<&str>) -> Result<(), ApiError> {
    match name {
        Some(name) => require_name(entity, name),
        None => Ok(()),
    }
}

pub async fn require_project(pool: &MySqlPool, tenant_id: i64, project_id: i64) -> Result<(), ApiError> {
    if !project_in_tenant(pool, tenant_id, project_id).await? {
        return Err(ApiError::not_found("Project", project_id));
    }
    Ok(())
}

// Assignees and owners must be users of the caller's tenant
pub async fn require_tenant_user(pool: &MySqlPool, tenant_id: i64, user_id: Option<i64>) -> Result<(), ApiError> {
    match user_id {
        Some(id) if !user_in_tenant(pool, tenant_id, id).await? => {
            Err(ApiError::BadRequest(format!("User with id {} does not exist", id)))
        }
        _ => Ok(()),
    }
}
