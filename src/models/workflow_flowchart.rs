use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use sqlx::{types::Json, FromRow};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkflowFlowchart {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub node_data: Option<Json<Value>>,
    pub link_data: Option<Json<Value>>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub created_date: NaiveDateTime,
    pub last_updated_date: NaiveDateTime,
}
