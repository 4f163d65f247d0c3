use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use sqlx::MySqlPool;

use super::workflow_flowchart_models::{
    CreateWorkflowFlowchartRequest, ReconcileResponse, UpdateWorkflowFlowchartRequest,
};
use crate::auth::session_user;
use crate::config::Settings;
use crate::db::user_watching::WatchCategory;
use crate::db::{workflow_flowchart, workflow_task_assoc};
use crate::errors::ApiError;
use crate::models::workflow_flowchart::WorkflowFlowchart;
use crate::notify::{notify_watchers, NotificationEvent, Notifier};
use crate::routes::common_models::{require_project, DefaultResponse};

fn flowchart_event(flowchart: &WorkflowFlowchart, message: String) -> NotificationEvent {
    NotificationEvent {
        data_type: "workflow_flowchart",
        data_id: flowchart.id,
        project_id: Some(flowchart.project_id),
        message,
        link: format!("/projects/{}/workflows/{}", flowchart.project_id, flowchart.id),
    }
}

pub async fn create_workflow_flowchart(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    req: web::Json<CreateWorkflowFlowchartRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create workflow flowchart {} in project {}", req.name, req.project_id);
    req.validate()?;
    require_project(&pool, caller.tenant_id, req.project_id).await?;

    let created = workflow_flowchart::create_workflow_flowchart(&pool, caller.tenant_id, caller.user_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || format!("Workflow flowchart with name '{}' already exists", req.name)))?;

    let event = flowchart_event(&created, format!("Created new workflow flowchart {}", created.name));
    notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::WorkflowFlowcharts, &event).await;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_all_project_workflow_flowcharts(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let project_id = path.into_inner();
    info!("Received request to list workflow flowcharts of project {}", project_id);
    require_project(&pool, caller.tenant_id, project_id).await?;
    let flowcharts =
        workflow_flowchart::get_all_project_workflow_flowcharts(&pool, caller.tenant_id, project_id).await?;
    Ok(HttpResponse::Ok().json(flowcharts))
}

pub async fn get_workflow_flowchart(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to get workflow flowchart {}", id);
    let found = workflow_flowchart::get_workflow_flowchart(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow flowchart", id))?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn get_workflow_flowchart_tasks(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request for tasks of workflow flowchart {}", id);
    if workflow_flowchart::get_workflow_flowchart(&pool, caller.tenant_id, id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Workflow flowchart", id));
    }
    Ok(HttpResponse::Ok().json(workflow_flowchart::get_workflow_task_ids(&pool, id).await?))
}

pub async fn update_workflow_flowchart(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
    req: web::Json<UpdateWorkflowFlowchartRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to update workflow flowchart {}", id);
    req.validate()?;

    let updated = workflow_flowchart::update_workflow_flowchart(&pool, caller.tenant_id, caller.user_id, id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || "Workflow flowchart already exists".into()))?
        .ok_or_else(|| ApiError::not_found("Workflow flowchart", id))?;

    if !updated.changes.is_empty() {
        let event = flowchart_event(&updated.row, updated.changes.summary());
        notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::WorkflowFlowcharts, &event).await;
    }
    Ok(HttpResponse::Ok().json(updated.row))
}

pub async fn delete_workflow_flowchart(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete workflow flowchart {}", id);

    let deleted = workflow_flowchart::delete_workflow_flowchart(&pool, caller.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow flowchart", id))?;

    let event = flowchart_event(&deleted, format!("Deleted workflow flowchart {}", deleted.name));
    notify_watchers(&pool, notifier.get_ref(), &config, WatchCategory::WorkflowFlowcharts, &event).await;
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!(
        "Successfully deleted workflow flowchart {}",
        id
    ))))
}

pub async fn reconcile_task_associations(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to reconcile workflow task associations for tenant {}", caller.tenant_id);

    let report = workflow_task_assoc::create_task_workflow_assoc(&pool, caller.tenant_id).await?;
    Ok(HttpResponse::Ok().json(ReconcileResponse {
        success: true,
        flowcharts: report.flowcharts,
        associations_created: report.associations_created,
    }))
}
