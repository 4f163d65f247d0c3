use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::wbs_models::{CreateWbsRequest, UpdateWbsRequest};
use crate::auth::session_user;
use crate::config::Settings;
use crate::db::user_watching::WatchCategory;
use crate::db::wbs;
use crate::errors::ApiError;
use crate::models::wbs::Wbs;
use crate::notify::{notify_watchers, NotificationEvent, Notifier};
use crate::routes::common_models::{require_project, require_tenant_user, DefaultResponse};

fn wbs_event(wbs: &Wbs, message: String) -> NotificationEvent {
    NotificationEvent {
        data_type: "wbs",
        data_id: wbs.id,
        project_id: Some(wbs.project_id),
        message,
        link: format!("/projects/{}/wbsstudio/{}", wbs.project_id, wbs.id),
    }
}

pub async fn create_wbs(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    req: web::Json<CreateWbsRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create wbs {} in project {}", req.name, req.project_id);
    req.validate()?;
    require_project(&pool, caller.tenant_id, req.project_id).await?;
    require_tenant_user(&pool, caller.tenant_id, req.user_id).await?;

    let created = wbs::create_wbs(&pool, caller.tenant_id, caller.user_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || format!("WBS with name '{}' already exists", req.name)))?;

    let event = wbs_event(&created, format!("Created new wbs {}", created.name));
    notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Wbs, &event).await;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_project_wbs(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let project_id = path.into_inner();
    info!("Received request to list wbs of project {}", project_id);
    require_project(&pool, caller.tenant_id, project_id).await?;
    Ok(HttpResponse::Ok().json(wbs::get_all_project_wbs(&pool, caller.tenant_id, project_id).await?))
}

pub async fn get_wbs(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get wbs {}", id);
    let found = wbs::get_wbs(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("WBS", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_wbs(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateWbsRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update wbs {}", id);
    req.validate()?;
    require_tenant_user(&pool, caller.tenant_id, req.user_id).await?;

    let updated = wbs::update_wbs(&pool, caller.tenant_id, caller.user_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || "WBS already exists".into()))?
        .ok_or_else(|| ApiError::not_found("WBS", id))?;

    if !updated.changes.is_empty() {
        let event = wbs_event(&updated.row, updated.changes.summary());
        notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Wbs, &event).await;
    }
    Ok(HttpResponse::Ok().json(updated.row))
}

pub async fn delete_wbs(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete wbs {}", id);

    let deleted = wbs::delete_wbs(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("WBS", id))?;

    let event = wbs_event(&deleted, format!("Deleted {}", deleted.name));
    notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::Wbs, &event).await;
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted wbs {}", id))))
}
