use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::project_models::{CreateProjectRequest, UpdateProjectRequest};
use crate::auth::session_user;
use crate::config::Settings;
use crate::db::project;
use crate::db::user_watching::WatchCategory;
use crate::errors::ApiError;
use crate::notify::{notify_watchers, NotificationEvent, Notifier};
use crate::routes::common_models::DefaultResponse;

fn duplicate_name(name: &str) -> String {
    format!("Project with name '{}' already exists", name)
}

pub async fn create_project(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<CreateProjectRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create project: {}", req.name);
    req.validate()?;

    let created = project::create_project(&pool, caller.tenant_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(&req.name)))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_projects(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to list projects of tenant {}", caller.tenant_id);
    let projects = project::get_all_projects(&pool, caller.tenant_id).await?;
    Ok(HttpResponse::Ok().json(projects))
}

pub async fn get_project(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get project {}", id);
    let found = project::get_project(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_project(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateProjectRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update project {}", id);
    req.validate()?;

    let updated = project::update_project(&pool, caller.tenant_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || duplicate_name(req.name.as_deref().unwrap_or_default())))?
        .ok_or_else(|| ApiError::not_found("Project", id))?;

    if !updated.changes.is_empty() {
        let event = NotificationEvent {
            data_type: "projects",
            data_id: id,
            project_id: Some(id),
            message: updated.changes.summary(),
            link: format!("/projects/{}", id),
        };
        notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Overview, &event).await;
    }
    Ok(HttpResponse::Ok().json(updated.row))
}

pub async fn delete_project(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete project {}", id);

    if !project::delete_project(&pool, caller.tenant_id, id).await? {
        return Err(ApiError::not_found("Project", id));
    }
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted project {}", id))))
}
