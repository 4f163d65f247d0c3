use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub tenant_id: i64,
    pub project_id: i64,
    pub wbs_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub created_date: NaiveDateTime,
    pub last_updated_date: NaiveDateTime,
}
