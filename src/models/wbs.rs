use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Wbs {
    pub id: i64,
    pub project_id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub created_date: NaiveDateTime,
    pub last_updated_date: NaiveDateTime,
}
