use sqlx::MySqlPool;

use crate::db::PartialUpdate;
use crate::models::workflow_event_log::WorkflowEventLog;
use crate::routes::workflow_event_log::workflow_event_log_models::{
    CreateWorkflowEventLogRequest, UpdateWorkflowEventLogRequest,
};

const SELECT_EVENT_LOG: &str = "SELECT id, tenant_id, workflow_event_id, event_type, \
     event_description, link, created_date FROM workflow_event_logs";

pub async fn create_workflow_event_log(
    pool: &MySqlPool,
    tenant_id: i64,
    log: &CreateWorkflowEventLogRequest,
) -> Result<WorkflowEventLog, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO workflow_event_logs (tenant_id, workflow_event_id, event_type, event_description, link)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(tenant_id)
    .bind(log.workflow_event_id)
    .bind(&log.event_type)
    .bind(&log.event_description)
    .bind(&log.link)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, WorkflowEventLog>(&format!("{} WHERE id = ?", SELECT_EVENT_LOG))
        .bind(result.last_insert_id() as i64)
        .fetch_one(pool)
        .await
}

pub async fn get_all_workflow_event_logs_by_workflow_event_id(
    pool: &MySqlPool,
    tenant_id: i64,
    workflow_event_id: i64,
) -> Result<Vec<WorkflowEventLog>, sqlx::Error> {
    sqlx::query_as::<_, WorkflowEventLog>(&format!(
        "{} WHERE workflow_event_id = ? AND tenant_id = ? ORDER BY created_date, id",
        SELECT_EVENT_LOG
    ))
    .bind(workflow_event_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn get_workflow_event_log(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
) -> Result<Option<WorkflowEventLog>, sqlx::Error> {
    sqlx::query_as::<_, WorkflowEventLog>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_EVENT_LOG))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_workflow_event_log(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
    log: &UpdateWorkflowEventLogRequest,
) -> Result<Option<WorkflowEventLog>, sqlx::Error> {
    if get_workflow_event_log(pool, tenant_id, id).await?.is_none() {
        return Ok(None);
    }

    let mut query = PartialUpdate::new("workflow_event_logs");
    query
        .set("workflow_event_id", log.workflow_event_id)
        .set("event_type", log.event_type.clone())
        .set("event_description", log.event_description.clone())
        .set("link", log.link.clone());
    query
        .execute(&mut *pool.acquire().await?, &[("id", id), ("tenant_id", tenant_id)])
        .await?;

    get_workflow_event_log(pool, tenant_id, id).await
}

pub async fn delete_workflow_event_log(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM workflow_event_logs WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
