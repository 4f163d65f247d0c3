use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use sqlx::MySqlPool;

use super::user_notification_models::{NotificationSettingsRequest, ScheduledNotificationsResponse};
use crate::auth::session_user;
use crate::config::Settings;
use crate::db::user_notification;
use crate::errors::ApiError;
use crate::notify::scheduled::{dispatch_scheduled_notifications, post_deadline_notifications};
use crate::notify::{Notifier, NotifyError};
use crate::routes::common_models::DefaultResponse;

pub async fn get_all_user_notifications(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to list notifications of user {}", caller.user_id);
    let notifications = user_notification::get_all_user_notifications(&pool, caller.user_id).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn delete_user_notification(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    let id = path.into_inner();
    info!("Received request to delete notification {} of user {}", id, caller.user_id);

    if !user_notification::delete_user_notification(&pool, caller.user_id, id).await? {
        return Err(ApiError::not_found("User notification", id));
    }
    Ok(HttpResponse::Ok().json(DefaultResponse::ok(format!("Successfully deleted notification {}", id))))
}

pub async fn create_settings(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<NotificationSettingsRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to create notification settings of user {}", caller.user_id);

    let settings = user_notification::create_settings(&pool, caller.user_id, &req)
        .await
        .map_err(|e| ApiError::from_write(e, || "Notification settings already exist for this user".into()))?;
    Ok(HttpResponse::Created().json(settings))
}

pub async fn get_settings(pool: web::Data<MySqlPool>, http: HttpRequest) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request for notification settings of user {}", caller.user_id);
    let settings = user_notification::get_settings(&pool, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification settings do not exist for this user".into()))?;
    Ok(HttpResponse::Ok().json(settings))
}

pub async fn update_settings(
    pool: web::Data<MySqlPool>,
    http: HttpRequest,
    req: web::Json<NotificationSettingsRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to update notification settings of user {}", caller.user_id);
    let settings = user_notification::update_settings(&pool, caller.user_id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification settings do not exist for this user".into()))?;
    Ok(HttpResponse::Ok().json(settings))
}

pub async fn scheduled_notifications(
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    config: web::Data<Settings>,
    http: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let caller = session_user(&pool, &http).await?;
    info!("Received request to send scheduled notifications for tenant {}", caller.tenant_id);

    let today = Utc::now().date_naive();
    let to_api_error = |e: NotifyError| match e {
        NotifyError::Store(e) => ApiError::Database(e),
        other => ApiError::Internal(other.to_string()),
    };
    let inbox = post_deadline_notifications(&pool, caller.tenant_id, today)
        .await
        .map_err(to_api_error)?;
    let report = dispatch_scheduled_notifications(&pool, notifier.get_ref(), &config, caller.tenant_id, today)
        .await
        .map_err(to_api_error)?;
    Ok(HttpResponse::Ok().json(ScheduledNotificationsResponse {
        success: true,
        notifications_posted: inbox.sent,
        sent: report.sent,
        already_sent: report.already_sent + inbox.already_sent,
        failed: report.failed + inbox.failed,
    }))
}
