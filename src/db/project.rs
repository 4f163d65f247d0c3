use sqlx::MySqlPool;

use crate::db::changes::{ChangeLog, Updated};
use crate::db::cost::{attach_costs, CostTarget};
use crate::db::keyword::{sync_keywords, KeywordTarget};
use crate::db::PartialUpdate;
use crate::models::project::Project;
use crate::routes::project::project_models::{CreateProjectRequest, UpdateProjectRequest};

const SELECT_PROJECT: &str =
    "SELECT id, tenant_id, name, description, created_date, last_updated_date FROM projects";

pub async fn create_project(
    pool: &MySqlPool,
    tenant_id: i64,
    project: &CreateProjectRequest,
) -> Result<Project, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query("INSERT INTO projects (tenant_id, name, description) VALUES (?, ?, ?)")
        .bind(tenant_id)
        .bind(&project.name)
        .bind(&project.description)
        .execute(&mut *tx)
        .await?
        .last_insert_id() as i64;

    if let Some(keywords) = &project.keywords {
        sync_keywords(&mut tx, tenant_id, KeywordTarget::Project(id), keywords).await?;
    }

    let created = sqlx::query_as::<_, Project>(&format!("{} WHERE id = ?", SELECT_PROJECT))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(created)
}

pub async fn get_all_projects(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!("{} WHERE tenant_id = ? ORDER BY id", SELECT_PROJECT))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

pub async fn get_project(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_PROJECT))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn project_in_tenant(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn update_project(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
    update: &UpdateProjectRequest,
) -> Result<Option<Updated<Project>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Project>(&format!(
        "{} WHERE id = ? AND tenant_id = ? FOR UPDATE",
        SELECT_PROJECT
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let mut changes = ChangeLog::new();
    changes.track("name", existing.name.as_str(), update.name.as_deref());
    changes.track_optional(
        "description",
        existing.description.as_deref(),
        update.description.as_deref(),
    );

    let mut query = PartialUpdate::new("projects");
    query
        .set("name", update.name.clone())
        .set("description", update.description.clone());
    query.execute(&mut tx, &[("id", id), ("tenant_id", tenant_id)]).await?;

    if let Some(cost_ids) = &update.cost_ids {
        attach_costs(&mut tx, tenant_id, CostTarget::Project(id), cost_ids).await?;
    }
    if let Some(keywords) = &update.keywords {
        sync_keywords(&mut tx, tenant_id, KeywordTarget::Project(id), keywords).await?;
    }

    let row = sqlx::query_as::<_, Project>(&format!("{} WHERE id = ?", SELECT_PROJECT))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Some(Updated {
        row,
        previous: existing,
        changes,
    }))
}

// Child rows (wbs, tasks, flowcharts, mappings) go with the project through ON DELETE CASCADE
pub async fn delete_project(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
