use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Deserialize)]
pub struct CreateKeywordRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateKeywordRequest {
    pub name: Option<String>,
}

impl CreateKeywordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Keyword", &self.name)
    }
}

impl UpdateKeywordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("Keyword", self.name.as_deref())
    }
}
