use sqlx::{mysql::MySqlConnection, MySqlPool};

use crate::db::PartialUpdate;
use crate::models::user_notification::{UserNotification, UserNotificationSettings};
use crate::routes::user_notification::user_notification_models::NotificationSettingsRequest;

const SELECT_SETTINGS: &str = "SELECT user_id, watch_email, watch_sms, assigned_email, assigned_sms, \
     scheduled_email, scheduled_sms, upcoming_event_deadline FROM user_notification_settings";

pub async fn get_all_user_notifications(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Vec<UserNotification>, sqlx::Error> {
    sqlx::query_as::<_, UserNotification>(
        "SELECT id, user_id, notification_data_type, notification_data_id, notification_data_path,
                notification_message, project_id, created
         FROM user_notifications WHERE user_id = ? ORDER BY created DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

// Users can only remove entries from their own inbox
pub async fn delete_user_notification(pool: &MySqlPool, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_notifications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn fetch_settings(
    conn: &mut MySqlConnection,
    user_id: i64,
) -> Result<Option<UserNotificationSettings>, sqlx::Error> {
    sqlx::query_as::<_, UserNotificationSettings>(&format!("{} WHERE user_id = ?", SELECT_SETTINGS))
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn get_settings(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Option<UserNotificationSettings>, sqlx::Error> {
    fetch_settings(&mut *pool.acquire().await?, user_id).await
}

/// Stores the first settings row of a user; absent flags take the column defaults.
pub async fn create_settings(
    pool: &MySqlPool,
    user_id: i64,
    request: &NotificationSettingsRequest,
) -> Result<UserNotificationSettings, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let created = insert_settings(&mut tx, user_id, request).await?;
    tx.commit().await?;
    Ok(created)
}

async fn insert_settings(
    conn: &mut MySqlConnection,
    user_id: i64,
    request: &NotificationSettingsRequest,
) -> Result<UserNotificationSettings, sqlx::Error> {
    sqlx::query("INSERT INTO user_notification_settings (user_id) VALUES (?)")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    apply_settings(conn, user_id, request).await?;
    fetch_settings(conn, user_id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_settings(
    pool: &MySqlPool,
    user_id: i64,
    request: &NotificationSettingsRequest,
) -> Result<Option<UserNotificationSettings>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if fetch_settings(&mut tx, user_id).await?.is_none() {
        return Ok(None);
    }
    apply_settings(&mut tx, user_id, request).await?;
    let updated = fetch_settings(&mut tx, user_id).await?;
    tx.commit().await?;
    Ok(updated)
}

async fn apply_settings(
    conn: &mut MySqlConnection,
    user_id: i64,
    request: &NotificationSettingsRequest,
) -> Result<(), sqlx::Error> {
    let mut query = PartialUpdate::new("user_notification_settings");
    query
        .set("watch_email", request.watch_email)
        .set("watch_sms", request.watch_sms)
        .set("assigned_email", request.assigned_email)
        .set("assigned_sms", request.assigned_sms)
        .set("scheduled_email", request.scheduled_email)
        .set("scheduled_sms", request.scheduled_sms)
        .set(
            "upcoming_event_deadline",
            request.upcoming_event_deadline.map(|d| d.as_str().to_string()),
        );
    query.execute(conn, &[("user_id", user_id)]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_tenant;
    use crate::notify::scheduled::UpcomingEventDeadline;
    use pretty_assertions::assert_eq;

    #[sqlx::test(migrations = "./migrations")]
    async fn settings_are_created_with_requested_flags(pool: MySqlPool) {
        let seed = seed_tenant(&pool, "Acme").await;
        let request = NotificationSettingsRequest {
            watch_sms: Some(true),
            upcoming_event_deadline: Some(UpcomingEventDeadline::SevenDaysPrior),
            ..Default::default()
        };

        let created = create_settings(&pool, seed.user_id, &request).await.unwrap();
        assert_eq!(created.user_id, seed.user_id);
        assert!(created.watch_sms);
        assert!(created.watch_email);
        assert_eq!(created.upcoming_event_deadline.as_deref(), Some("seven_days_prior"));

        let err = create_settings(&pool, seed.user_id, &request).await.unwrap_err();
        assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn abandoned_settings_insert_leaves_no_row(pool: MySqlPool) {
        let seed = seed_tenant(&pool, "Acme").await;

        let mut tx = pool.begin().await.unwrap();
        insert_settings(&mut tx, seed.user_id, &NotificationSettingsRequest::default())
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(get_settings(&pool, seed.user_id).await.unwrap(), None);
        let created = create_settings(&pool, seed.user_id, &NotificationSettingsRequest::default())
            .await
            .unwrap();
        assert_eq!(created.user_id, seed.user_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn updating_missing_settings_returns_none(pool: MySqlPool) {
        let seed = seed_tenant(&pool, "Acme").await;
        let updated = update_settings(&pool, seed.user_id, &NotificationSettingsRequest::default())
            .await
            .unwrap();
        assert_eq!(updated, None);
    }
}
