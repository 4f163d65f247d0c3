use log::{debug, error, info};

use super::notifier::{EmailMessage, Notifier, NotifyError, SmsMessage};
use super::store::{NotificationStore, Recipient};
use crate::config::Settings;
use crate::models::user_notification::UserNotificationSettings;

/// Which settings flags govern a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The user watches the changed part of a project.
    Watch,
    /// The user was assigned to the changed object.
    Assigned,
}

impl Channel {
    fn label(&self) -> &'static str {
        match self {
            Channel::Watch => "watch",
            Channel::Assigned => "assigned",
        }
    }

    // (email, sms)
    fn flags(&self, settings: &UserNotificationSettings) -> (bool, bool) {
        match self {
            Channel::Watch => (settings.watch_email, settings.watch_sms),
            Channel::Assigned => (settings.assigned_email, settings.assigned_sms),
        }
    }
}

/// A state change worth telling users about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub data_type: &'static str,
    pub data_id: i64,
    pub project_id: Option<i64>,
    pub message: String,
    /// Frontend path of the changed object, without the server prefix.
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Email(EmailMessage),
    Sms(SmsMessage),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub messages_sent: usize,
    pub failed: Vec<i64>,
}

/// Decides what to send to one recipient. Without stored settings the user
/// gets an email only.
pub fn plan_delivery(
    recipient: &Recipient,
    settings: Option<&UserNotificationSettings>,
    channel: Channel,
    message: &str,
    full_link: &str,
    app_name: &str,
) -> Vec<Delivery> {
    let (email_on, sms_on) = match settings {
        Some(settings) => channel.flags(settings),
        None => (true, false),
    };
    let text = format!("{} Link: {}", message, full_link);
    let mut deliveries = Vec::new();

    if email_on && !recipient.email.is_empty() {
        deliveries.push(Delivery::Email(EmailMessage {
            to: recipient.email.clone(),
            subject: message.to_string(),
            body: format!(
                "You are receiving this notification as you have your email {} notifications switched on.\n{}\nBest Regards\n{} Team",
                channel.label(),
                text,
                app_name
            ),
        }));
    }
    if sms_on {
        if let Some(phone_no) = recipient.phone_no.as_deref().filter(|p| !p.is_empty()) {
            deliveries.push(Delivery::Sms(SmsMessage {
                phone_no: phone_no.to_string(),
                body: text,
            }));
        }
    }
    deliveries
}

/// Sends the planned messages to one user. Returns how many went out.
pub async fn notify_user(
    notifier: &dyn Notifier,
    recipient: &Recipient,
    settings: Option<&UserNotificationSettings>,
    channel: Channel,
    event: &NotificationEvent,
    config: &Settings,
) -> Result<usize, NotifyError> {
    let full_link = format!("{}{}", config.frontend_server_url, event.link);
    debug!("link {}", full_link);

    let deliveries = plan_delivery(
        recipient,
        settings,
        channel,
        &event.message,
        &full_link,
        &config.app_name,
    );
    for delivery in &deliveries {
        match delivery {
            Delivery::Email(email) => notifier.send_email(email).await?,
            Delivery::Sms(sms) => notifier.send_sms(sms).await?,
        }
    }
    Ok(deliveries.len())
}

/// Records the notification for one user, then delivers it according to
/// their settings.
pub async fn notify_one<S>(
    store: &S,
    notifier: &dyn Notifier,
    config: &Settings,
    user_id: i64,
    event: &NotificationEvent,
    channel: Channel,
) -> Result<usize, NotifyError>
where
    S: NotificationStore + ?Sized,
{
    store.add_notification(user_id, event).await?;
    let settings = store.notification_settings(user_id).await?;
    let recipient = store
        .recipient(user_id)
        .await?
        .ok_or(NotifyError::UnknownUser(user_id))?;
    notify_user(notifier, &recipient, settings.as_ref(), channel, event, config).await
}

/// Fans one event out to every watcher. A failure for one watcher is logged
/// and does not stop the others.
pub async fn manage_notifications<S>(
    store: &S,
    notifier: &dyn Notifier,
    config: &Settings,
    watchers: &[i64],
    event: &NotificationEvent,
) -> FanOutReport
where
    S: NotificationStore + ?Sized,
{
    let mut report = FanOutReport::default();
    for &user_id in watchers {
        match notify_one(store, notifier, config, user_id, event, Channel::Watch).await {
            Ok(sent) => {
                report.delivered += 1;
                report.messages_sent += sent;
            }
            Err(e) => {
                error!("Error managing notifications for user {}: {}", user_id, e);
                report.failed.push(user_id);
            }
        }
    }
    info!(
        "Notified {} of {} watchers about {} {}",
        report.delivered,
        watchers.len(),
        event.data_type,
        event.data_id
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn config() -> Settings {
        Settings {
            database_url: String::new(),
            max_connections: 1,
            server_address: String::new(),
            frontend_server_url: "https://grc.example.com".into(),
            email_sender: "no-reply@grc.example.com".into(),
            app_name: "GRC".into(),
        }
    }

    fn recipient(user_id: i64, phone_no: Option<&str>) -> Recipient {
        Recipient {
            user_id,
            email: format!("user{}@example.com", user_id),
            phone_no: phone_no.map(str::to_string),
        }
    }

    fn event() -> NotificationEvent {
        NotificationEvent {
            data_type: "wbs",
            data_id: 12,
            project_id: Some(3),
            message: "Created new wbs Phase 1".into(),
            link: "/projects/3/wbsstudio/12".into(),
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        recorded: Mutex<Vec<(i64, String)>>,
        settings: HashMap<i64, UserNotificationSettings>,
        recipients: HashMap<i64, Recipient>,
        broken: HashSet<i64>,
    }

    #[async_trait]
    impl NotificationStore for MemoryStore {
        async fn add_notification(&self, user_id: i64, event: &NotificationEvent) -> Result<(), NotifyError> {
            if self.broken.contains(&user_id) {
                return Err(NotifyError::Store(sqlx::Error::PoolTimedOut));
            }
            self.recorded
                .lock()
                .unwrap()
                .push((user_id, event.message.clone()));
            Ok(())
        }

        async fn notification_settings(
            &self,
            user_id: i64,
        ) -> Result<Option<UserNotificationSettings>, NotifyError> {
            Ok(self.settings.get(&user_id).cloned())
        }

        async fn recipient(&self, user_id: i64) -> Result<Option<Recipient>, NotifyError> {
            Ok(self.recipients.get(&user_id).cloned())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        emails: Mutex<Vec<EmailMessage>>,
        sms: Mutex<Vec<SmsMessage>>,
        reject_email_to: Option<String>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_email(&self, email: &EmailMessage) -> Result<(), NotifyError> {
            if self.reject_email_to.as_deref() == Some(email.to.as_str()) {
                return Err(NotifyError::Transport {
                    channel: "email",
                    reason: "mailbox unavailable".into(),
                });
            }
            self.emails.lock().unwrap().push(email.clone());
            Ok(())
        }

        async fn send_sms(&self, sms: &SmsMessage) -> Result<(), NotifyError> {
            self.sms.lock().unwrap().push(sms.clone());
            Ok(())
        }
    }

    #[test]
    fn missing_settings_fall_back_to_email_only() {
        let deliveries = plan_delivery(
            &recipient(1, Some("+15550100")),
            None,
            Channel::Watch,
            "Created new wbs Phase 1",
            "https://grc.example.com/projects/3/wbsstudio/12",
            "GRC",
        );

        assert_eq!(deliveries.len(), 1);
        let Delivery::Email(email) = &deliveries[0] else {
            panic!("expected an email");
        };
        assert_eq!(email.to, "user1@example.com");
        assert_eq!(email.subject, "Created new wbs Phase 1");
        assert_eq!(
            email.body,
            "You are receiving this notification as you have your email watch notifications switched on.\n\
             Created new wbs Phase 1 Link: https://grc.example.com/projects/3/wbsstudio/12\n\
             Best Regards\nGRC Team"
        );
    }

    #[test]
    fn watch_flags_select_sms() {
        let settings = UserNotificationSettings {
            user_id: 1,
            watch_sms: true,
            ..Default::default()
        };
        let deliveries = plan_delivery(
            &recipient(1, Some("+15550100")),
            Some(&settings),
            Channel::Watch,
            "msg",
            "/x",
            "GRC",
        );
        assert_eq!(
            deliveries,
            vec![Delivery::Sms(SmsMessage {
                phone_no: "+15550100".into(),
                body: "msg Link: /x".into(),
            })]
        );
    }

    #[test]
    fn assigned_channel_ignores_watch_flags() {
        let settings = UserNotificationSettings {
            user_id: 1,
            watch_email: true,
            watch_sms: true,
            assigned_email: false,
            assigned_sms: false,
            ..Default::default()
        };
        let deliveries = plan_delivery(
            &recipient(1, Some("+15550100")),
            Some(&settings),
            Channel::Assigned,
            "msg",
            "/x",
            "GRC",
        );
        assert!(deliveries.is_empty());
    }

    #[test]
    fn sms_needs_a_phone_number() {
        let settings = UserNotificationSettings {
            user_id: 1,
            assigned_email: true,
            assigned_sms: true,
            ..Default::default()
        };
        let deliveries = plan_delivery(
            &recipient(1, None),
            Some(&settings),
            Channel::Assigned,
            "msg",
            "/x",
            "GRC",
        );
        assert_eq!(deliveries.len(), 1);
        assert!(matches!(deliveries[0], Delivery::Email(_)));
    }

    #[tokio::test]
    async fn failing_watcher_does_not_stop_the_others() {
        let mut store = MemoryStore::default();
        for user_id in [1, 2, 3] {
            store.recipients.insert(user_id, recipient(user_id, None));
        }
        store.broken.insert(2);
        let notifier = RecordingNotifier::default();

        let report = manage_notifications(&store, &notifier, &config(), &[1, 2, 3], &event()).await;

        assert_eq!(
            report,
            FanOutReport {
                delivered: 2,
                messages_sent: 2,
                failed: vec![2],
            }
        );
        let recorded: Vec<i64> = store.recorded.lock().unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(recorded, vec![1, 3]);
        let sent_to: Vec<String> = notifier.emails.lock().unwrap().iter().map(|e| e.to.clone()).collect();
        assert_eq!(sent_to, vec!["user1@example.com", "user3@example.com"]);
    }

    #[tokio::test]
    async fn transport_failure_is_isolated_per_user() {
        let mut store = MemoryStore::default();
        store.recipients.insert(1, recipient(1, None));
        store.recipients.insert(2, recipient(2, None));
        let notifier = RecordingNotifier {
            reject_email_to: Some("user1@example.com".into()),
            ..Default::default()
        };

        let report = manage_notifications(&store, &notifier, &config(), &[1, 2], &event()).await;

        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.delivered, 1);
        // the inbox entry is written before delivery is attempted
        assert_eq!(store.recorded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        let err = notify_one(&store, &notifier, &config(), 99, &event(), Channel::Assigned)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::UnknownUser(99)));
    }

    #[tokio::test]
    async fn links_are_prefixed_with_the_frontend_url() {
        let notifier = RecordingNotifier::default();
        let sent = notify_user(&notifier, &recipient(4, None), None, Channel::Watch, &event(), &config())
            .await
            .unwrap();

        assert_eq!(sent, 1);
        let emails = notifier.emails.lock().unwrap();
        assert!(emails[0]
            .body
            .contains("Link: https://grc.example.com/projects/3/wbsstudio/12"));
    }
}
