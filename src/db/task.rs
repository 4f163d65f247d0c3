use sqlx::{mysql::MySqlConnection, MySqlPool};

use crate::db::changes::{ChangeLog, Updated};
use crate::db::cost::{attach_costs, CostTarget};
use crate::db::keyword::{sync_keywords, KeywordTarget};
use crate::db::PartialUpdate;
use crate::models::task::Task;
use crate::routes::task::task_models::{CreateTaskRequest, TaskStatus, UpdateTaskRequest};

const SELECT_TASK: &str = "SELECT id, tenant_id, project_id, wbs_id, name, description, assigned_to, \
     due_date, status, created_date, last_updated_date FROM tasks";

async fn fetch_task(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    id: i64,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_TASK))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await
}

async fn add_task_history(
    conn: &mut MySqlConnection,
    task_id: i64,
    author_id: i64,
    history: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO task_history (task_id, author_id, history) VALUES (?, ?, ?)")
        .bind(task_id)
        .bind(author_id)
        .bind(history)
        .execute(conn)
        .await?;
    Ok(())
}

/// Checks that the WBS exists and belongs to the project.
pub async fn wbs_in_project(pool: &MySqlPool, project_id: i64, wbs_id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wbs WHERE id = ? AND project_id = ?")
        .bind(wbs_id)
        .bind(project_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// The caller checks that the project, WBS and assignee belong to the tenant.
pub async fn create_task(
    pool: &MySqlPool,
    tenant_id: i64,
    author_id: i64,
    task: &CreateTaskRequest,
) -> Result<Task, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let status = task.status.unwrap_or(TaskStatus::NotStarted);
    let id = sqlx::query(
        "INSERT INTO tasks (tenant_id, project_id, wbs_id, name, description, assigned_to, due_date, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(tenant_id)
    .bind(task.project_id)
    .bind(task.wbs_id)
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.assigned_to)
    .bind(task.due_date)
    .bind(status.as_str())
    .execute(&mut *tx)
    .await?
    .last_insert_id() as i64;

    add_task_history(&mut tx, id, author_id, &format!("Created new task {}", task.name)).await?;
    if let Some(keywords) = &task.keywords {
        sync_keywords(&mut tx, tenant_id, KeywordTarget::Task(id), keywords).await?;
    }

    let created = fetch_task(&mut tx, tenant_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(created)
}

pub async fn get_all_project_tasks(
    pool: &MySqlPool,
    tenant_id: i64,
    project_id: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "{} WHERE project_id = ? AND tenant_id = ? ORDER BY id",
        SELECT_TASK
    ))
    .bind(project_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn get_task(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Task>, sqlx::Error> {
    fetch_task(&mut *pool.acquire().await?, tenant_id, id).await
}

pub async fn update_task(
    pool: &MySqlPool,
    tenant_id: i64,
    author_id: i64,
    id: i64,
    update: &UpdateTaskRequest,
) -> Result<Option<Updated<Task>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(existing) = fetch_task(&mut tx, tenant_id, id).await? else {
        return Ok(None);
    };

    let status = update.status.map(|s| s.as_str());
    let mut changes = ChangeLog::new();
    changes.track("name", existing.name.as_str(), update.name.as_deref());
    changes.track_optional(
        "description",
        existing.description.as_deref(),
        update.description.as_deref(),
    );
    changes.track_optional("wbs_id", existing.wbs_id.as_ref(), update.wbs_id.as_ref());
    changes.track_optional("assigned_to", existing.assigned_to.as_ref(), update.assigned_to.as_ref());
    changes.track_optional("due_date", existing.due_date.as_ref(), update.due_date.as_ref());
    changes.track("status", existing.status.as_str(), status);
    for change in changes.entries() {
        add_task_history(&mut tx, id, author_id, change).await?;
    }

    let mut query = PartialUpdate::new("tasks");
    query
        .set("name", update.name.clone())
        .set("description", update.description.clone())
        .set("wbs_id", update.wbs_id)
        .set("assigned_to", update.assigned_to)
        .set("due_date", update.due_date)
        .set("status", status);
    query.execute(&mut tx, &[("id", id), ("tenant_id", tenant_id)]).await?;

    if let Some(cost_ids) = &update.cost_ids {
        attach_costs(&mut tx, tenant_id, CostTarget::Task(id), cost_ids).await?;
    }
    if let Some(keywords) = &update.keywords {
        sync_keywords(&mut tx, tenant_id, KeywordTarget::Task(id), keywords).await?;
    }

    let row = fetch_task(&mut tx, tenant_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(Some(Updated {
        row,
        previous: existing,
        changes,
    }))
}

/// Deletes a task together with its history, cost, keyword and workflow rows.
pub async fn delete_task_rows(conn: &mut MySqlConnection, task_id: i64) -> Result<(), sqlx::Error> {
    for table in ["task_history", "task_costs", "keyword_mappings", "workflow_task_mappings"] {
        sqlx::query(&format!("DELETE FROM {} WHERE task_id = ?", table))
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
    }
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn delete_task(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Task>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(existing) = fetch_task(&mut tx, tenant_id, id).await? else {
        return Ok(None);
    };
    delete_task_rows(&mut tx, id).await?;

    tx.commit().await?;
    Ok(Some(existing))
}
