use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Keyword {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub created_date: NaiveDateTime,
    pub last_updated_date: NaiveDateTime,
}
