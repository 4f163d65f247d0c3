use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};

use super::fanout::NotificationEvent;
use super::notifier::NotifyError;
use crate::models::user_notification::UserNotificationSettings;

/// Contact details of a notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Recipient {
    pub user_id: i64,
    pub email: String,
    pub phone_no: Option<String>,
}

/// Persistence the fan-out needs: the notification inbox, per-user settings
/// and contact details.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn add_notification(&self, user_id: i64, event: &NotificationEvent) -> Result<(), NotifyError>;

    async fn notification_settings(
        &self,
        user_id: i64,
    ) -> Result<Option<UserNotificationSettings>, NotifyError>;

    async fn recipient(&self, user_id: i64) -> Result<Option<Recipient>, NotifyError>;
}

#[async_trait]
impl NotificationStore for MySqlPool {
    async fn add_notification(&self, user_id: i64, event: &NotificationEvent) -> Result<(), NotifyError> {
        sqlx::query(
            "INSERT INTO user_notifications
                (user_id, notification_data_type, notification_data_id, notification_data_path, notification_message, project_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(event.data_type)
        .bind(event.data_id)
        .bind(&event.link)
        .bind(&event.message)
        .bind(event.project_id)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn notification_settings(
        &self,
        user_id: i64,
    ) -> Result<Option<UserNotificationSettings>, NotifyError> {
        let settings = crate::db::user_notification::get_settings(self, user_id).await?;
        Ok(settings)
    }

    async fn recipient(&self, user_id: i64) -> Result<Option<Recipient>, NotifyError> {
        let recipient = sqlx::query_as::<_, Recipient>(
            "SELECT id AS user_id, email, phone_no FROM users WHERE id = ? AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_optional(self)
        .await?;
        Ok(recipient)
    }
}
