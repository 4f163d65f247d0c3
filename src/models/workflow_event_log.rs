use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkflowEventLog {
    pub id: i64,
    pub tenant_id: i64,
    pub workflow_event_id: Option<i64>,
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    pub link: Option<String>,
    pub created_date: NaiveDateTime,
}
