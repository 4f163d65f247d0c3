use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateWorkflowEventLogRequest {
    pub workflow_event_id: Option<i64>,
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkflowEventLogRequest {
    pub workflow_event_id: Option<i64>,
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    pub link: Option<String>,
}
