use std::collections::BTreeSet;

use log::{info, warn};
use serde_json::Value;
use sqlx::{mysql::MySqlConnection, MySqlPool};

/// Node categories that stand for a task in a flowchart.
const TASK_CATEGORIES: [&str; 2] = ["Parent", "Child"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub flowcharts: usize,
    pub associations_created: usize,
}

fn node_key(node: &Value) -> Option<i64> {
    match node.get("key")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Task ids referenced by the task nodes of a flowchart's `node_data`.
pub fn task_ids_from_nodes(node_data: &Value) -> BTreeSet<i64> {
    let Some(nodes) = node_data.as_array() else {
        return BTreeSet::new();
    };
    nodes
        .iter()
        .filter(|node| {
            node.get("category")
                .and_then(Value::as_str)
                .is_some_and(|c| TASK_CATEGORIES.contains(&c))
        })
        .filter_map(node_key)
        .collect()
}

/// Derived task ids with no mapping row yet, in ascending order.
pub fn missing_associations(derived: &BTreeSet<i64>, existing: &BTreeSet<i64>) -> Vec<i64> {
    derived.difference(existing).copied().collect()
}

/// Inserts the task mappings a flowchart's node data implies but the table
/// lacks. Existing mappings are left alone. Returns how many were inserted.
pub async fn create_task_workflow_assoc_for_workflow(
    conn: &mut MySqlConnection,
    flowchart_id: i64,
) -> Result<usize, sqlx::Error> {
    let flowchart: Option<(i64, Option<sqlx::types::Json<Value>>)> =
        sqlx::query_as("SELECT project_id, node_data FROM workflow_flowcharts WHERE id = ?")
            .bind(flowchart_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((project_id, Some(node_data))) = flowchart else {
        return Ok(0);
    };

    let derived = task_ids_from_nodes(&node_data.0);
    if derived.is_empty() {
        return Ok(0);
    }

    let project_tasks: BTreeSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM tasks WHERE project_id = ?")
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();
    let (known, unknown): (BTreeSet<i64>, BTreeSet<i64>) =
        derived.into_iter().partition(|id| project_tasks.contains(id));
    if !unknown.is_empty() {
        warn!(
            "Workflow flowchart {} references tasks outside project {}: {:?}",
            flowchart_id, project_id, unknown
        );
    }

    let existing: BTreeSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT task_id FROM workflow_task_mappings WHERE workflow_flowchart_id = ?")
            .bind(flowchart_id)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .collect();

    let mut created = 0;
    for task_id in missing_associations(&known, &existing) {
        let result =
            sqlx::query("INSERT IGNORE INTO workflow_task_mappings (task_id, workflow_flowchart_id) VALUES (?, ?)")
                .bind(task_id)
                .bind(flowchart_id)
                .execute(&mut *conn)
                .await?;
        created += result.rows_affected() as usize;
    }
    Ok(created)
}

/// Reconciles every flowchart of the tenant in one transaction.
pub async fn create_task_workflow_assoc(pool: &MySqlPool, tenant_id: i64) -> Result<ReconcileReport, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let flowchart_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT f.id FROM workflow_flowcharts f JOIN projects p ON f.project_id = p.id
         WHERE p.tenant_id = ? ORDER BY f.id",
    )
    .bind(tenant_id)
    .fetch_all(&mut *tx)
    .await?;

    let mut report = ReconcileReport::default();
    for flowchart_id in flowchart_ids {
        report.associations_created += create_task_workflow_assoc_for_workflow(&mut tx, flowchart_id).await?;
        report.flowcharts += 1;
    }

    tx.commit().await?;
    info!(
        "Reconciled {} workflow flowcharts for tenant {}, {} task associations created",
        report.flowcharts, tenant_id, report.associations_created
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn only_task_nodes_contribute_ids() {
        let nodes = json!([
            {"key": 11, "category": "Parent", "text": "Collect evidence"},
            {"key": "12", "category": "Child"},
            {"key": 13, "category": "Start"},
            {"key": 14},
            {"key": "abc", "category": "Child"},
            {"key": 11, "category": "Child"}
        ]);

        assert_eq!(task_ids_from_nodes(&nodes), BTreeSet::from([11, 12]));
    }

    #[test]
    fn non_list_node_data_yields_nothing() {
        assert!(task_ids_from_nodes(&json!({"key": 1, "category": "Parent"})).is_empty());
        assert!(task_ids_from_nodes(&Value::Null).is_empty());
    }

    #[test]
    fn only_missing_edges_are_planned() {
        let derived = BTreeSet::from([1, 2, 3]);
        let existing = BTreeSet::from([2, 9]);
        assert_eq!(missing_associations(&derived, &existing), vec![1, 3]);

        let all_present = BTreeSet::from([1, 2, 3]);
        assert!(missing_associations(&derived, &all_present).is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reconciling_twice_only_inserts_missing_edges(pool: MySqlPool) {
        use crate::db::test_support::{count, seed_task, seed_tenant};

        let seed = seed_tenant(&pool, "Acme").await;
        let first = seed_task(&pool, seed, "Collect evidence", None).await;
        let second = seed_task(&pool, seed, "Review evidence", None).await;
        let other = seed_tenant(&pool, "Globex").await;
        let foreign = seed_task(&pool, other, "Not ours", None).await;

        let nodes = json!([
            {"key": first, "category": "Parent"},
            {"key": second.to_string(), "category": "Child"},
            {"key": foreign, "category": "Child"},
            {"key": 0, "category": "Start"}
        ]);
        let flowchart_id = sqlx::query("INSERT INTO workflow_flowcharts (project_id, name, node_data) VALUES (?, ?, ?)")
            .bind(seed.project_id)
            .bind("Evidence flow")
            .bind(sqlx::types::Json(&nodes))
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_id() as i64;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(create_task_workflow_assoc_for_workflow(&mut conn, flowchart_id).await.unwrap(), 2);
        assert_eq!(create_task_workflow_assoc_for_workflow(&mut conn, flowchart_id).await.unwrap(), 0);
        drop(conn);

        let mapped: BTreeSet<i64> = sqlx::query_scalar::<_, i64>(
            "SELECT task_id FROM workflow_task_mappings WHERE workflow_flowchart_id = ?",
        )
        .bind(flowchart_id)
        .fetch_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .collect();
        assert_eq!(mapped, BTreeSet::from([first, second]));

        let report = create_task_workflow_assoc(&pool, seed.tenant_id).await.unwrap();
        assert_eq!(report, ReconcileReport { flowcharts: 1, associations_created: 0 });
        assert_eq!(
            count(&pool, "SELECT COUNT(*) FROM workflow_task_mappings WHERE task_id = ?", foreign).await,
            0
        );
    }
}
