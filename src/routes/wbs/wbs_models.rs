use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Deserialize)]
pub struct CreateWbsRequest {
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub user_id: Option<i64>,
    pub keywords: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateWbsRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub keywords: Option<String>,
    pub cost_ids: Option<Vec<i64>>,
}

impl CreateWbsRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("WBS", &self.name)
    }
}

impl UpdateWbsRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("WBS", self.name.as_deref())
    }
}
