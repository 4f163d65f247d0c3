use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::workflow_event_log_models::{CreateWorkflowEventLogRequest, UpdateWorkflowEventLogRequest};
use crate::auth::session_user;
use crate::db::workflow_event_log;
use crate::errors::ApiError;
use crate::routes::common_models::DefaultResponse;

pub async fn create_workflow_event_log(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<CreateWorkflowEventLogRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create workflow event log for event {:?}", req.workflow_event_id);

    let created = workflow_event_log::create_workflow_event_log(&pool, caller.tenant_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || "Workflow event log already exists".into()))?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_workflow_event_logs_by_event(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let workflow_event_id = path.into_inner();
    info!("Received request to list logs of workflow event {}", workflow_event_id);
    let logs = workflow_event_log::get_all_workflow_event_logs_by_workflow_event_id(
        &pool,
        caller.tenant_id,
        workflow_event_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(logs))
}

pub async fn get_workflow_event_log(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get workflow event log {}", id);
    let found = workflow_event_log::get_workflow_event_log(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow event log", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn update_workflow_event_log(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateWorkflowEventLogRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update workflow event log {}", id);

    let updated = workflow_event_log::update_workflow_event_log(&pool, caller.tenant_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || "Workflow event log already exists".into()))?
        .ok_or_else(|| ApiError::not_found("Workflow event log", id))?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_workflow_event_log(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete workflow event log {}", id);

    if !workflow_event_log::delete_workflow_event_log(&pool, caller.tenant_id, id).await? {
        return Err(ApiError::not_found("Workflow event log", id));
    }
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!(
        "Successfully deleted workflow event log {}",
        id
    ))))
}
