use sqlx::{mysql::MySqlConnection, MySqlPool};

use crate::db::changes::{ChangeLog, Updated};
use crate::db::cost::{attach_costs, CostTarget};
use crate::db::keyword::{sync_keywords, KeywordTarget};
use crate::db::task::delete_task_rows;
use crate::db::PartialUpdate;
use crate::models::wbs::Wbs;
use crate::routes::wbs::wbs_models::{CreateWbsRequest, UpdateWbsRequest};

const SELECT_WBS: &str = "SELECT w.id, w.project_id, w.user_id, w.name, w.description, \
     w.created_date, w.last_updated_date FROM wbs w JOIN projects p ON w.project_id = p.id";

async fn fetch_wbs(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    id: i64,
) -> Result<Option<Wbs>, sqlx::Error> {
    sqlx::query_as::<_, Wbs>(&format!("{} WHERE w.id = ? AND p.tenant_id = ?", SELECT_WBS))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await
}

async fn add_wbs_history(
    conn: &mut MySqlConnection,
    wbs_id: i64,
    author_id: i64,
    history: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO wbs_history (wbs_id, author_id, history) VALUES (?, ?, ?)")
        .bind(wbs_id)
        .bind(author_id)
        .bind(history)
        .execute(conn)
        .await?;
    Ok(())
}

/// The caller checks that the project belongs to the tenant.
pub async fn create_wbs(
    pool: &MySqlPool,
    tenant_id: i64,
    author_id: i64,
    wbs: &CreateWbsRequest,
) -> Result<Wbs, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query("INSERT INTO wbs (project_id, user_id, name, description) VALUES (?, ?, ?, ?)")
        .bind(wbs.project_id)
        .bind(wbs.user_id)
        .bind(&wbs.name)
        .bind(&wbs.description)
        .execute(&mut *tx)
        .await?
        .last_insert_id() as i64;

    add_wbs_history(&mut tx, id, author_id, &format!("Created new wbs {}", wbs.name)).await?;
    if let Some(keywords) = &wbs.keywords {
        sync_keywords(&mut tx, tenant_id, KeywordTarget::Wbs(id), keywords).await?;
    }

    let created = fetch_wbs(&mut tx, tenant_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(created)
}

pub async fn get_all_project_wbs(
    pool: &MySqlPool,
    tenant_id: i64,
    project_id: i64,
) -> Result<Vec<Wbs>, sqlx::Error> {
    sqlx::query_as::<_, Wbs>(&format!(
        "{} WHERE w.project_id = ? AND p.tenant_id = ? ORDER BY w.id",
        SELECT_WBS
    ))
    .bind(project_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn get_wbs(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Wbs>, sqlx::Error> {
    fetch_wbs(&mut *pool.acquire().await?, tenant_id, id).await
}

/// Applies the partial update and writes one history row per changed field.
pub async fn update_wbs(
    pool: &MySqlPool,
    tenant_id: i64,
    author_id: i64,
    id: i64,
    update: &UpdateWbsRequest,
) -> Result<Option<Updated<Wbs>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(existing) = fetch_wbs(&mut tx, tenant_id, id).await? else {
        return Ok(None);
    };

    let mut changes = ChangeLog::new();
    changes.track("name", existing.name.as_str(), update.name.as_deref());
    changes.track_optional(
        "description",
        existing.description.as_deref(),
        update.description.as_deref(),
    );
    changes.track_optional("user_id", existing.user_id.as_ref(), update.user_id.as_ref());
    for change in changes.entries() {
        add_wbs_history(&mut tx, id, author_id, change).await?;
    }

    let mut query = PartialUpdate::new("wbs");
    query
        .set("name", update.name.clone())
        .set("description", update.description.clone())
        .set("user_id", update.user_id);
    query.execute(&mut tx, &[("id", id)]).await?;

    if let Some(cost_ids) = &update.cost_ids {
        attach_costs(&mut tx, tenant_id, CostTarget::Wbs(id), cost_ids).await?;
    }
    if let Some(keywords) = &update.keywords {
        sync_keywords(&mut tx, tenant_id, KeywordTarget::Wbs(id), keywords).await?;
    }

    let row = fetch_wbs(&mut tx, tenant_id, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    tx.commit().await?;
    Ok(Some(Updated {
        row,
        previous: existing,
        changes,
    }))
}

/// Removes the WBS with its mappings, history and child tasks. Returns the
/// deleted row so watchers can be told about it.
pub async fn delete_wbs(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Wbs>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(existing) = fetch_wbs(&mut tx, tenant_id, id).await? else {
        return Ok(None);
    };

    for table in ["keyword_mappings", "wbs_costs", "wbs_history"] {
        sqlx::query(&format!("DELETE FROM {} WHERE wbs_id = ?", table))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    let task_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM tasks WHERE wbs_id = ?")
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
    for task_id in task_ids {
        delete_task_rows(&mut tx, task_id).await?;
    }

    sqlx::query("DELETE FROM wbs WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(existing))
}
