use serde::{Deserialize, Serialize};

use crate::notify::scheduled::UpcomingEventDeadline;

// Used for both create and update; absent flags keep their current value
#[derive(Debug, Default, Deserialize)]
pub struct NotificationSettingsRequest {
    pub watch_email: Option<bool>,
    pub watch_sms: Option<bool>,
    pub assigned_email: Option<bool>,
    pub assigned_sms: Option<bool>,
    pub scheduled_email: Option<bool>,
    pub scheduled_sms: Option<bool>,
    pub upcoming_event_deadline: Option<UpcomingEventDeadline>,
}

#[derive(Debug, Serialize)]
pub struct ScheduledNotificationsResponse {
    pub success: bool,
    /// In-app due-soon and overdue entries written.
    pub notifications_posted: usize,
    /// Reminder emails and texts sent.
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
}
