use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Deserialize)]
pub struct CreateRiskImpactRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRiskImpactRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreateRiskImpactRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Risk impact", &self.name)
    }
}

impl UpdateRiskImpactRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("Risk impact", self.name.as_deref())
    }
}
