use sqlx::{mysql::MySqlConnection, types::Json, MySqlPool};

use crate::db::changes::{ChangeLog, Updated};
use crate::db::cost::{attach_costs, CostTarget};
use crate::db::workflow_task_assoc::create_task_workflow_assoc_for_workflow;
use crate::db::PartialUpdate;
use crate::models::workflow_flowchart::WorkflowFlowchart;
use crate::routes::workflow_flowchart::workflow_flowchart_models::{
    CreateWorkflowFlowchartRequest, UpdateWorkflowFlowchartRequest,
};

const SELECT_FLOWCHART: &str = "SELECT f.id, f.project_id, f.name, f.node_data, f.link_data, f.start_date, \
     f.due_date, f.status, f.created_date, f.last_updated_date \
     FROM workflow_flowcharts f JOIN projects p ON f.project_id = p.id";

async fn fetch_flowchart(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    id: i64,
) -> Result<Option<WorkflowFlowchart>, sqlx::Error> {
    sqlx::query_as::<_, WorkflowFlowchart>(&format!("{} WHERE f.id = ? AND p.tenant_id = ?", SELECT_FLOWCHART))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await
}

async fn add_flowchart_history(
    conn: &mut MySqlConnection,
    flowchart_id: i64,
    author_id: i64,
    history: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO workflow_flowchart_history (workflow_flowchart_id, author_id, history) VALUES (?, ?, ?)",
    )
    .bind(flowchart_id)
    .bind(author_id)
    .bind(history)
    .execute(conn)
    .await?;
    Ok(())
}

/// Inserts the flowchart and the task mappings its node data implies.
pub async fn create_workflow_flowchart(
    pool: &MySqlPool,
    tenant_id: i64,
    author_id: i64,
    flowchart: &CreateWorkflowFlowchartRequest,
) -> Result<WorkflowFlowchart, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        "INSERT INTO workflow_flowcharts (project_id, name, node_data, link_data, start_date, due_date, status)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(flowchart.project_id)
    .bind(&flowchart.name)
    .bind(flowchart.node_data.as_ref().map(Json))
    .bind(flowchart.link_data.as_ref().map(Json))
    .bind(flowchart.start_date)
    .bind(flowchart.due_date)
    .bind(&flowchart.status)
    .execute(&mut *tx)
    .await?
    .last_insert_id() as i64;

    add_flowchart_history(
        &mut tx,
        id,
        author_id,
        &format!("Created new workflow flowchart {}", flowchart.name),
    )
    .await?;
    create_task_workflow_assoc_for_workflow(&mut tx, id).await?;

    let created = fetch_flowchart(&mut tx, tenant_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(created)
}

pub async fn get_all_project_workflow_flowcharts(
    pool: &MySqlPool,
    tenant_id: i64,
    project_id: i64,
) -> Result<Vec<WorkflowFlowchart>, sqlx::Error> {
    sqlx::query_as::<_, WorkflowFlowchart>(&format!(
        "{} WHERE f.project_id = ? AND p.tenant_id = ? ORDER BY f.id",
        SELECT_FLOWCHART
    ))
    .bind(project_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn get_workflow_flowchart(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<WorkflowFlowchart>, sqlx::Error> {
    fetch_flowchart(&mut *pool.acquire().await?, tenant_id, id).await
}

/// Applies the update, then reconciles task mappings against the new node data.
pub async fn update_workflow_flowchart(
    pool: &MySqlPool,
    tenant_id: i64,
    author_id: i64,
    id: i64,
    update: &UpdateWorkflowFlowchartRequest,
) -> Result<Option<Updated<WorkflowFlowchart>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(existing) = fetch_flowchart(&mut tx, tenant_id, id).await? else {
        return Ok(None);
    };

    let mut changes = ChangeLog::new();
    changes.track("name", existing.name.as_str(), update.name.as_deref());
    changes.track_optional("start_date", existing.start_date.as_ref(), update.start_date.as_ref());
    changes.track_optional("due_date", existing.due_date.as_ref(), update.due_date.as_ref());
    changes.track_optional("status", existing.status.as_deref(), update.status.as_deref());
    for change in changes.entries() {
        add_flowchart_history(&mut tx, id, author_id, change).await?;
    }

    let mut query = PartialUpdate::new("workflow_flowcharts");
    query
        .set("name", update.name.clone())
        .set("node_data", update.node_data.clone().map(Json))
        .set("link_data", update.link_data.clone().map(Json))
        .set("start_date", update.start_date)
        .set("due_date", update.due_date)
        .set("status", update.status.clone());
    query.execute(&mut tx, &[("id", id)]).await?;

    if let Some(cost_ids) = &update.cost_ids {
        attach_costs(&mut tx, tenant_id, CostTarget::WorkflowFlowchart(id), cost_ids).await?;
    }
    create_task_workflow_assoc_for_workflow(&mut tx, id).await?;

    let row = fetch_flowchart(&mut tx, tenant_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(Some(Updated {
        row,
        previous: existing,
        changes,
    }))
}

pub async fn delete_workflow_flowchart(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<WorkflowFlowchart>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(existing) = fetch_flowchart(&mut tx, tenant_id, id).await? else {
        return Ok(None);
    };

    for table in [
        "workflow_flowchart_costs",
        "workflow_flowchart_history",
        "workflow_task_mappings",
    ] {
        sqlx::query(&format!("DELETE FROM {} WHERE workflow_flowchart_id = ?", table))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM workflow_flowcharts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(existing))
}

/// Task ids currently mapped to the flowchart.
pub async fn get_workflow_task_ids(pool: &MySqlPool, flowchart_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT task_id FROM workflow_task_mappings WHERE workflow_flowchart_id = ? ORDER BY task_id")
        .bind(flowchart_id)
        .fetch_all(pool)
        .await
}
