use sqlx::MySqlPool;

use crate::models::user_watching::UserWatching;
use crate::routes::user_watching::user_watching_models::UpdateUserWatchingRequest;

/// The parts of a project a user can watch; each is a column of `user_watching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCategory {
    Overview,
    Tasks,
    Wbs,
    WorkflowFlowcharts,
}

impl WatchCategory {
    pub fn column(&self) -> &'static str {
        match self {
            WatchCategory::Overview => "project_overview",
            WatchCategory::Tasks => "project_tasks",
            WatchCategory::Wbs => "project_wbs",
            WatchCategory::WorkflowFlowcharts => "project_workflow_flowcharts",
        }
    }
}

/// Ids of the users watching `category` on the project.
pub async fn watchers_for(
    pool: &MySqlPool,
    project_id: i64,
    category: WatchCategory,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT user_id FROM user_watching WHERE project_id = ? AND {} = TRUE ORDER BY user_id",
        category.column()
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn get_user_watching(
    pool: &MySqlPool,
    project_id: i64,
    user_id: i64,
) -> Result<Option<UserWatching>, sqlx::Error> {
    sqlx::query_as::<_, UserWatching>(
        "SELECT id, project_id, user_id, project_overview, project_tasks, project_wbs, project_workflow_flowcharts
         FROM user_watching WHERE project_id = ? AND user_id = ?",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Inserts the row on first use; absent flags keep their stored value (false for a new row).
pub async fn upsert_user_watching(
    pool: &MySqlPool,
    project_id: i64,
    user_id: i64,
    update: &UpdateUserWatchingRequest,
) -> Result<UserWatching, sqlx::Error> {
    let current = get_user_watching(pool, project_id, user_id).await?;
    let (overview, tasks, wbs, flowcharts) = match &current {
        Some(row) => (
            row.project_overview,
            row.project_tasks,
            row.project_wbs,
            row.project_workflow_flowcharts,
        ),
        None => (false, false, false, false),
    };

    sqlx::query(
        "INSERT INTO user_watching
            (project_id, user_id, project_overview, project_tasks, project_wbs, project_workflow_flowcharts)
         VALUES (?, ?, ?, ?, ?, ?)
         ON DUPLICATE KEY UPDATE
            project_overview = VALUES(project_overview),
            project_tasks = VALUES(project_tasks),
            project_wbs = VALUES(project_wbs),
            project_workflow_flowcharts = VALUES(project_workflow_flowcharts)",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(update.project_overview.unwrap_or(overview))
    .bind(update.project_tasks.unwrap_or(tasks))
    .bind(update.project_wbs.unwrap_or(wbs))
    .bind(update.project_workflow_flowcharts.unwrap_or(flowcharts))
    .execute(pool)
    .await?;

    get_user_watching(pool, project_id, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}
