use sqlx::{mysql::MySqlConnection, MySqlPool};

use crate::db::PartialUpdate;
use crate::models::cost::Cost;
use crate::routes::cost::cost_models::{CreateCostRequest, UpdateCostRequest};

const SELECT_COST: &str = "SELECT id, tenant_id, name, description, price, currency, quantity, \
     sales_tax, rn_number, serial_number, created_date, last_updated_date FROM costs";

/// Objects a cost can be attached to, one mapping table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostTarget {
    Project(i64),
    Wbs(i64),
    Task(i64),
    WorkflowFlowchart(i64),
}

impl CostTarget {
    pub const MAPPING_TABLES: [&'static str; 4] =
        ["project_costs", "wbs_costs", "task_costs", "workflow_flowchart_costs"];

    pub fn table(&self) -> &'static str {
        match self {
            CostTarget::Project(_) => "project_costs",
            CostTarget::Wbs(_) => "wbs_costs",
            CostTarget::Task(_) => "task_costs",
            CostTarget::WorkflowFlowchart(_) => "workflow_flowchart_costs",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CostTarget::Project(_) => "project_id",
            CostTarget::Wbs(_) => "wbs_id",
            CostTarget::Task(_) => "task_id",
            CostTarget::WorkflowFlowchart(_) => "workflow_flowchart_id",
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            CostTarget::Project(id)
            | CostTarget::Wbs(id)
            | CostTarget::Task(id)
            | CostTarget::WorkflowFlowchart(id) => id,
        }
    }
}

pub async fn create_cost(
    pool: &MySqlPool,
    tenant_id: i64,
    cost: &CreateCostRequest,
) -> Result<Cost, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO costs (tenant_id, name, description, price, currency, quantity, sales_tax, rn_number, serial_number)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(tenant_id)
    .bind(&cost.name)
    .bind(&cost.description)
    .bind(cost.price)
    .bind(&cost.currency)
    .bind(cost.quantity)
    .bind(cost.sales_tax)
    .bind(&cost.rn_number)
    .bind(&cost.serial_number)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Cost>(&format!("{} WHERE id = ?", SELECT_COST))
        .bind(result.last_insert_id() as i64)
        .fetch_one(pool)
        .await
}

pub async fn get_all_costs(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<Cost>, sqlx::Error> {
    sqlx::query_as::<_, Cost>(&format!("{} WHERE tenant_id = ? ORDER BY id", SELECT_COST))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

pub async fn get_cost(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Cost>, sqlx::Error> {
    sqlx::query_as::<_, Cost>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_COST))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_cost(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
    cost: &UpdateCostRequest,
) -> Result<Option<Cost>, sqlx::Error> {
    if get_cost(pool, tenant_id, id).await?.is_none() {
        return Ok(None);
    }

    let mut query = PartialUpdate::new("costs");
    query
        .set("name", cost.name.clone())
        .set("description", cost.description.clone())
        .set("price", cost.price)
        .set("currency", cost.currency.clone())
        .set("quantity", cost.quantity)
        .set("sales_tax", cost.sales_tax)
        .set("rn_number", cost.rn_number.clone())
        .set("serial_number", cost.serial_number.clone());

    let mut conn = pool.acquire().await?;
    query.execute(&mut conn, &[("id", id), ("tenant_id", tenant_id)]).await?;
    drop(conn);

    get_cost(pool, tenant_id, id).await
}

/// Deletes the cost after removing every mapping that references it.
pub async fn delete_cost(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM costs WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Ok(false);
    }

    for table in CostTarget::MAPPING_TABLES {
        sqlx::query(&format!("DELETE FROM {} WHERE cost_id = ?", table))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM costs WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Attaches the given costs to `target`. Ids that are not costs of the
/// tenant, or are already attached, are skipped. Returns how many were added.
pub async fn attach_costs(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    target: CostTarget,
    cost_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "INSERT IGNORE INTO {} ({}, cost_id) SELECT ?, id FROM costs WHERE id = ? AND tenant_id = ?",
        target.table(),
        target.column()
    );
    let mut attached = 0;
    for cost_id in cost_ids {
        let result = sqlx::query(&sql)
            .bind(target.id())
            .bind(cost_id)
            .bind(tenant_id)
            .execute(&mut *conn)
            .await?;
        attached += result.rows_affected();
    }
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_target_maps_to_a_known_table() {
        let targets = [
            CostTarget::Project(1),
            CostTarget::Wbs(2),
            CostTarget::Task(3),
            CostTarget::WorkflowFlowchart(4),
        ];
        for target in targets {
            assert!(CostTarget::MAPPING_TABLES.contains(&target.table()));
        }
        assert_eq!(CostTarget::WorkflowFlowchart(4).column(), "workflow_flowchart_id");
        assert_eq!(CostTarget::Task(3).id(), 3);
    }

    mod database {
        use super::*;
        use crate::db::test_support::{count, seed_task, seed_tenant};
        use crate::errors::ApiError;
        use pretty_assertions::assert_eq;

        fn laptop() -> CreateCostRequest {
            CreateCostRequest {
                name: "Laptop".into(),
                description: None,
                price: Some(1200.0),
                currency: Some("USD".into()),
                quantity: Some(2),
                sales_tax: None,
                rn_number: None,
                serial_number: None,
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn created_cost_belongs_to_the_caller(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            let other = seed_tenant(&pool, "Globex").await;

            let cost = create_cost(&pool, seed.tenant_id, &laptop()).await.unwrap();
            assert_eq!(cost.tenant_id, seed.tenant_id);
            assert_eq!(cost.quantity, Some(2));

            assert!(get_cost(&pool, other.tenant_id, cost.id).await.unwrap().is_none());
            let update = UpdateCostRequest {
                name: Some("Stolen".into()),
                ..Default::default()
            };
            assert!(update_cost(&pool, other.tenant_id, cost.id, &update).await.unwrap().is_none());
            assert!(!delete_cost(&pool, other.tenant_id, cost.id).await.unwrap());
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn missing_cost_is_not_found(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            assert!(update_cost(&pool, seed.tenant_id, 999, &UpdateCostRequest::default())
                .await
                .unwrap()
                .is_none());
            assert!(!delete_cost(&pool, seed.tenant_id, 999).await.unwrap());
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn duplicate_cost_name_is_a_conflict(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            create_cost(&pool, seed.tenant_id, &laptop()).await.unwrap();

            let err = create_cost(&pool, seed.tenant_id, &laptop()).await.unwrap_err();
            let err = ApiError::from_write(err, || "Cost with name Laptop already exists".into());
            assert!(matches!(err, ApiError::Conflict(ref m) if m == "Cost with name Laptop already exists"));

            let other = seed_tenant(&pool, "Globex").await;
            assert!(create_cost(&pool, other.tenant_id, &laptop()).await.is_ok());
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn deleting_a_cost_detaches_it_first(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            let task_id = seed_task(&pool, seed, "Buy hardware", None).await;
            let cost = create_cost(&pool, seed.tenant_id, &laptop()).await.unwrap();

            let mut conn = pool.acquire().await.unwrap();
            let attached = attach_costs(&mut conn, seed.tenant_id, CostTarget::Task(task_id), &[cost.id, cost.id])
                .await
                .unwrap();
            attach_costs(&mut conn, seed.tenant_id, CostTarget::Project(seed.project_id), &[cost.id])
                .await
                .unwrap();
            drop(conn);
            assert_eq!(attached, 1);

            assert!(delete_cost(&pool, seed.tenant_id, cost.id).await.unwrap());
            for table in CostTarget::MAPPING_TABLES {
                let sql = format!("SELECT COUNT(*) FROM {} WHERE cost_id = ?", table);
                assert_eq!(count(&pool, &sql, cost.id).await, 0, "{}", table);
            }
            assert!(get_cost(&pool, seed.tenant_id, cost.id).await.unwrap().is_none());
        }
    }
}
