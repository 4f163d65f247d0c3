use serde::{Deserialize, Serialize};

use crate::models::user_watching::UserWatching;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserWatchingRequest {
    pub project_overview: Option<bool>,
    pub project_tasks: Option<bool>,
    pub project_wbs: Option<bool>,
    pub project_workflow_flowcharts: Option<bool>,
}

// What the caller watches on a project; all false when nothing is stored yet
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UserWatchingResponse {
    pub project_id: i64,
    pub project_overview: bool,
    pub project_tasks: bool,
    pub project_wbs: bool,
    pub project_workflow_flowcharts: bool,
}

impl UserWatchingResponse {
    pub fn new(project_id: i64, row: Option<&UserWatching>) -> Self {
        match row {
            Some(row) => UserWatchingResponse {
                project_id,
                project_overview: row.project_overview,
                project_tasks: row.project_tasks,
                project_wbs: row.project_wbs,
                project_workflow_flowcharts: row.project_workflow_flowcharts,
            },
            None => UserWatchingResponse {
                project_id,
                ..Default::default()
            },
        }
    }
}
