use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserWatching {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub project_overview: bool,
    pub project_tasks: bool,
    pub project_wbs: bool,
    pub project_workflow_flowcharts: bool,
}
