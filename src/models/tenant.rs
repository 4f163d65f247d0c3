use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Serialize, FromRow)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub created_date: NaiveDateTime,
}
