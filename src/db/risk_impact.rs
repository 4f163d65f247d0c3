use sqlx::MySqlPool;

use crate::db::PartialUpdate;
use crate::models::risk_impact::RiskImpact;
use crate::routes::risk_impact::risk_impact_models::{CreateRiskImpactRequest, UpdateRiskImpactRequest};

const SELECT_RISK_IMPACT: &str =
    "SELECT id, tenant_id, name, description, created_date, last_updated_date FROM risk_impacts";

pub async fn create_risk_impact(
    pool: &MySqlPool,
    tenant_id: i64,
    risk_impact: &CreateRiskImpactRequest,
) -> Result<RiskImpact, sqlx::Error> {
    let result = sqlx::query("INSERT INTO risk_impacts (tenant_id, name, description) VALUES (?, ?, ?)")
        .bind(tenant_id)
        .bind(&risk_impact.name)
        .bind(&risk_impact.description)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, RiskImpact>(&format!("{} WHERE id = ?", SELECT_RISK_IMPACT))
        .bind(result.last_insert_id() as i64)
        .fetch_one(pool)
        .await
}

pub async fn get_all_risk_impacts(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<RiskImpact>, sqlx::Error> {
    sqlx::query_as::<_, RiskImpact>(&format!("{} WHERE tenant_id = ? ORDER BY id", SELECT_RISK_IMPACT))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

pub async fn get_risk_impact(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<RiskImpact>, sqlx::Error> {
    sqlx::query_as::<_, RiskImpact>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_RISK_IMPACT))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_risk_impact(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
    risk_impact: &UpdateRiskImpactRequest,
) -> Result<Option<RiskImpact>, sqlx::Error> {
    if get_risk_impact(pool, tenant_id, id).await?.is_none() {
        return Ok(None);
    }

    let mut query = PartialUpdate::new("risk_impacts");
    query
        .set("name", risk_impact.name.clone())
        .set("description", risk_impact.description.clone());
    query
        .execute(&mut *pool.acquire().await?, &[("id", id), ("tenant_id", tenant_id)])
        .await?;

    get_risk_impact(pool, tenant_id, id).await
}

pub async fn delete_risk_impact(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM risk_impacts WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
