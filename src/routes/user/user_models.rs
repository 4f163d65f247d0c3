use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::common_models::require_name;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_no: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub admin: CreateUserRequest,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::BadRequest("A valid email is required".into()));
        }
        if self.password.len() < 8 {
            return Err(ApiError::BadRequest("Password must be at least 8 characters".into()));
        }
        Ok(())
    }
}

impl CreateTenantRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Tenant", &self.name)?;
        self.admin.validate()
    }
}
