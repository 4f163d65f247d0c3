use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::task_models::{CreateTaskRequest, UpdateTaskRequest};
use crate::auth::session_user;
use crate::config::Settings;
use crate::db::task;
use crate::db::user_watching::WatchCategory;
use crate::errors::ApiError;
use crate::models::task::Task;
use crate::notify::{notify_assignee, notify_watchers, NotificationEvent, Notifier};
use crate::routes::common_models::{require_project, require_tenant_user, DefaultResponse};

fn task_event(task: &Task, message: String) -> NotificationEvent {
    NotificationEvent {
        data_type: "tasks",
        data_id: task.id,
        project_id: Some(task.project_id),
        message,
        link: format!("/projects/{}/tasks/{}", task.project_id, task.id),
    }
}

async fn require_wbs(pool: &MySqlPool, project_id: i64, wbs_id: Option<i64>) -> Result<(), ApiError> {
    match wbs_id {
        Some(id) if !task::wbs_in_project(pool, project_id, id).await? => Err(ApiError::BadRequest(format!(
            "WBS with id {} does not exist in project {}",
            id, project_id
        ))),
        _ => Ok(()),
    }
}

pub async fn create_task(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    req: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create task {} in project {}", req.name, req.project_id);
    req.validate()?;
    require_project(&pool, caller.tenant_id, req.project_id).await?;
    require_wbs(&pool, req.project_id, req.wbs_id).await?;
    require_tenant_user(&pool, caller.tenant_id, req.assigned_to).await?;

    let created = task::create_task(&pool, caller.tenant_id, caller.user_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || format!("Task with name '{}' already exists", req.name)))?;

    let event = task_event(&created, format!("Created new task {}", created.name));
    notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Tasks, &event).await;
    if let Some(assignee) = created.assigned_to {
        let event = task_event(&created, format!("You have been assigned to a new task {}", created.name));
        notify_assignee(&pool, notifier.get_ref(), &config, assignee, &event).await;
    }
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_project_tasks(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let project_id = path.into_inner();
    info!("Received request to list tasks of project {}", project_id);
    require_project(&pool, caller.tenant_id, project_id).await?;
    Ok(HttpResponse::Ok().json(task::get_all_project_tasks(&pool, caller.tenant_id, project_id).await?))
}

pub async fn get_task(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get task {}", id);
    let found = task::get_task(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_task(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update task {}", id);
    req.validate()?;

    let existing = task::get_task(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", id))?;
    require_wbs(&pool, existing.project_id, req.wbs_id).await?;
    require_tenant_user(&pool, caller.tenant_id, req.assigned_to).await?;

    let updated = task::update_task(&pool, caller.tenant_id, caller.user_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || "Task already exists".into()))?
        .ok_or_else(|| ApiError::not_found("Task", id))?;

    if !updated.changes.is_empty() {
        let event = task_event(&updated.row, updated.changes.summary());
        notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Tasks, &event).await;
    }
    if let Some(assignee) = updated.row.assigned_to.filter(|a| updated.previous.assigned_to != Some(*a)) {
        let event = task_event(&updated.row, format!("You have been assigned to task {}", updated.row.name));
        notify_assignee(&pool, notifier.get_ref(), &config, assignee, &event).await;
    }
    Ok(HttpResponse::Ok().json(updated.row))
}

pub async fn delete_task(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete task {}", id);

    let deleted = task::delete_task(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", id))?;

    let event = task_event(&deleted, format!("Deleted task {}", deleted.name));
    notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Tasks, &event).await;
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted task {}", id))))
}
