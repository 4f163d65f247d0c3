use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Complete,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Complete => "complete",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub wbs_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub keywords: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub wbs_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub keywords: Option<String>,
    pub cost_ids: Option<Vec<i64>>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Task", &self.name)
    }
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("Task", self.name.as_deref())
    }
}
