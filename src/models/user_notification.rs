use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Serialize, FromRow)]
pub struct UserNotification {
    pub id: i64,
    pub user_id: i64,
    pub notification_data_type: String,
    pub notification_data_id: Option<i64>,
    pub notification_data_path: Option<String>,
    pub notification_message: String,
    pub project_id: Option<i64>,
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct UserNotificationSettings {
    pub user_id: i64,
    pub watch_email: bool,
    pub watch_sms: bool,
    pub assigned_email: bool,
    pub assigned_sms: bool,
    pub scheduled_email: bool,
    pub scheduled_sms: bool,
    pub upcoming_event_deadline: Option<String>,
}
