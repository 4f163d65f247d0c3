use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    // comma separated keyword names
    pub keywords: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub cost_ids: Option<Vec<i64>>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Project", &self.name)
    }
}

impl UpdateProjectRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("Project", self.name.as_deref())
    }
}
