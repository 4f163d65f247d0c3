// src/notify/mod.rs
//
// Notification records and best-effort email/SMS delivery.

pub mod fanout;
pub mod notifier;
pub mod scheduled;
pub mod store;

use log::error;
use sqlx::MySqlPool;

use crate::config::Settings;
use crate::db::user_watching::{watchers_for, WatchCategory};

pub use fanout::{manage_notifications, notify_one, Channel, FanOutReport, NotificationEvent};
pub use notifier::{LogNotifier, Notifier, NotifyError};

/// Notifies everyone watching `category` on the event's project. Lookup
/// failures are logged; notifications never fail the request that caused them.
pub async fn notify_watchers(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    config: &Settings,
    category: WatchCategory,
    event: &NotificationEvent,
) -> FanOutReport {
    let Some(project_id) = event.project_id else {
        return FanOutReport::default();
    };
    match watchers_for(pool, project_id, category).await {
        Ok(watchers) => manage_notifications(pool, notifier, config, &watchers, event).await,
        Err(e) => {
            error!("Failed to load watchers of project {}: {}", project_id, e);
            FanOutReport::default()
        }
    }
}

/// Tells a newly assigned user about the object over the assigned channel.
pub async fn notify_assignee(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    config: &Settings,
    user_id: i64,
    event: &NotificationEvent,
) {
    if let Err(e) = notify_one(pool, notifier, config, user_id, event, Channel::Assigned).await {
        error!("Error notifying assignee {}: {}", user_id, e);
    }
}
