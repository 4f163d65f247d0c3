use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cost {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub quantity: Option<i32>,
    pub sales_tax: Option<f64>,
    pub rn_number: Option<String>,
    pub serial_number: Option<String>,
    pub created_date: NaiveDateTime,
    pub last_updated_date: NaiveDateTime,
}
