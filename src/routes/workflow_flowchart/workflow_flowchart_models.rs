use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Deserialize)]
pub struct CreateWorkflowFlowchartRequest {
    pub name: String,
    pub project_id: i64,
    pub node_data: Option<Value>,
    pub link_data: Option<Value>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateWorkflowFlowchartRequest {
    pub name: Option<String>,
    pub node_data: Option<Value>,
    pub link_data: Option<Value>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub cost_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub flowcharts: usize,
    pub associations_created: usize,
}

fn require_list(field: &str, value: Option<&Value>) -> Result<(), ApiError> {
    match value {
        Some(value) if !value.is_array() => Err(ApiError::BadRequest(format!("{} must be a list", field))),
        _ => Ok(()),
    }
}

impl CreateWorkflowFlowchartRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Workflow flowchart", &self.name)?;
        require_list("node_data", self.node_data.as_ref())?;
        require_list("link_data", self.link_data.as_ref())
    }
}

impl UpdateWorkflowFlowchartRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("Workflow flowchart", self.name.as_deref())?;
        require_list("node_data", self.node_data.as_ref())?;
        require_list("link_data", self.link_data.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_data_must_be_a_list() {
        let request = UpdateWorkflowFlowchartRequest {
            node_data: Some(json!({"key": 1})),
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(ApiError::BadRequest(_))));

        let request = UpdateWorkflowFlowchartRequest {
            node_data: Some(json!([{"key": 1, "category": "Parent"}])),
            link_data: Some(json!([])),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}
