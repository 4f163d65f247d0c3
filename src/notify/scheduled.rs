use chrono::{Duration, NaiveDate};
use log::{error, info};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};

use super::fanout::NotificationEvent;
use super::notifier::{EmailMessage, Notifier, NotifyError, SmsMessage};
use super::store::NotificationStore;
use crate::config::Settings;

/// How long before a due date a user wants to be reminded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpcomingEventDeadline {
    OneDayPrior,
    ThreeDaysPrior,
    FiveDaysPrior,
    SevenDaysPrior,
    FifteenDaysPrior,
    ThirtyDaysPrior,
    SixtyDaysPrior,
    NinetyDaysPrior,
}

impl UpcomingEventDeadline {
    pub fn days_prior(&self) -> i64 {
        match self {
            UpcomingEventDeadline::OneDayPrior => 1,
            UpcomingEventDeadline::ThreeDaysPrior => 3,
            UpcomingEventDeadline::FiveDaysPrior => 5,
            UpcomingEventDeadline::SevenDaysPrior => 7,
            UpcomingEventDeadline::FifteenDaysPrior => 15,
            UpcomingEventDeadline::ThirtyDaysPrior => 30,
            UpcomingEventDeadline::SixtyDaysPrior => 60,
            UpcomingEventDeadline::NinetyDaysPrior => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpcomingEventDeadline::OneDayPrior => "one_day_prior",
            UpcomingEventDeadline::ThreeDaysPrior => "three_days_prior",
            UpcomingEventDeadline::FiveDaysPrior => "five_days_prior",
            UpcomingEventDeadline::SevenDaysPrior => "seven_days_prior",
            UpcomingEventDeadline::FifteenDaysPrior => "fifteen_days_prior",
            UpcomingEventDeadline::ThirtyDaysPrior => "thirty_days_prior",
            UpcomingEventDeadline::SixtyDaysPrior => "sixty_days_prior",
            UpcomingEventDeadline::NinetyDaysPrior => "ninety_days_prior",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let deadline = match value {
            "one_day_prior" => UpcomingEventDeadline::OneDayPrior,
            "three_days_prior" => UpcomingEventDeadline::ThreeDaysPrior,
            "five_days_prior" => UpcomingEventDeadline::FiveDaysPrior,
            "seven_days_prior" => UpcomingEventDeadline::SevenDaysPrior,
            "fifteen_days_prior" => UpcomingEventDeadline::FifteenDaysPrior,
            "thirty_days_prior" => UpcomingEventDeadline::ThirtyDaysPrior,
            "sixty_days_prior" => UpcomingEventDeadline::SixtyDaysPrior,
            "ninety_days_prior" => UpcomingEventDeadline::NinetyDaysPrior,
            _ => return None,
        };
        Some(deadline)
    }
}

/// A user with scheduled reminders on, joined with one task assigned to them.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderCandidate {
    pub user_id: i64,
    pub email: String,
    pub phone_no: Option<String>,
    pub scheduled_email: bool,
    pub scheduled_sms: bool,
    pub upcoming_event_deadline: Option<String>,
    pub task_name: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub user_id: i64,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub message: String,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScheduledReport {
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
}

/// A reminder is due when the task's due date minus the lead time is today.
pub fn reminder_for(candidate: &ReminderCandidate, today: NaiveDate) -> Option<Reminder> {
    let deadline = candidate
        .upcoming_event_deadline
        .as_deref()
        .and_then(UpcomingEventDeadline::parse)?;
    let days = deadline.days_prior();
    if candidate.due_date - Duration::days(days) != today {
        return None;
    }

    let email = Some(candidate.email.clone()).filter(|e| candidate.scheduled_email && !e.is_empty());
    let phone_no = candidate
        .phone_no
        .clone()
        .filter(|p| candidate.scheduled_sms && !p.is_empty());
    if email.is_none() && phone_no.is_none() {
        return None;
    }

    Some(Reminder {
        user_id: candidate.user_id,
        email,
        phone_no,
        message: format!(
            "A task {} you are assigned to is due in {} days",
            candidate.task_name, days
        ),
    })
}

async fn reminder_candidates(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<ReminderCandidate>, sqlx::Error> {
    sqlx::query_as::<_, ReminderCandidate>(
        "SELECT s.user_id, u.email, u.phone_no, s.scheduled_email, s.scheduled_sms,
                s.upcoming_event_deadline, t.name AS task_name, t.due_date
         FROM user_notification_settings s
         JOIN users u ON u.id = s.user_id
         JOIN tasks t ON t.assigned_to = s.user_id
         WHERE u.tenant_id = ? AND t.tenant_id = ? AND u.is_active = TRUE
           AND t.due_date IS NOT NULL
           AND s.upcoming_event_deadline IS NOT NULL
           AND (s.scheduled_email = TRUE OR s.scheduled_sms = TRUE)",
    )
    .bind(tenant_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Delivery route of a reminder; each one has its own ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderChannel {
    Email,
    Sms,
}

impl ReminderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Email => "email",
            ReminderChannel::Sms => "sms",
        }
    }
}

impl Reminder {
    /// The channels this reminder goes out on, with their destination.
    pub fn deliveries(&self) -> Vec<(ReminderChannel, &str)> {
        let mut deliveries = Vec::new();
        if let Some(email) = &self.email {
            deliveries.push((ReminderChannel::Email, email.as_str()));
        }
        if let Some(phone_no) = &self.phone_no {
            deliveries.push((ReminderChannel::Sms, phone_no.as_str()));
        }
        deliveries
    }
}

async fn already_sent(
    pool: &MySqlPool,
    reminder: &Reminder,
    channel: ReminderChannel,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM email_notifications WHERE user_id = ? AND channel = ? AND message = ?",
    )
    .bind(reminder.user_id)
    .bind(channel.as_str())
    .bind(&reminder.message)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

async fn send_reminder(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    config: &Settings,
    reminder: &Reminder,
    channel: ReminderChannel,
    destination: &str,
) -> Result<(), NotifyError> {
    match channel {
        ReminderChannel::Email => {
            notifier
                .send_email(&EmailMessage {
                    to: destination.to_string(),
                    subject: reminder.message.clone(),
                    body: format!(
                        "You are receiving this notification as you have your scheduled notifications switched on.\n{}\nBest Regards\n{} Team",
                        reminder.message, config.app_name
                    ),
                })
                .await?
        }
        ReminderChannel::Sms => {
            notifier
                .send_sms(&SmsMessage {
                    phone_no: destination.to_string(),
                    body: reminder.message.clone(),
                })
                .await?
        }
    }

    sqlx::query("INSERT INTO email_notifications (user_id, channel, email, message) VALUES (?, ?, ?, ?)")
        .bind(reminder.user_id)
        .bind(channel.as_str())
        .bind(destination)
        .bind(&reminder.message)
        .execute(pool)
        .await?;
    Ok(())
}

/// Lead times, in days, of the in-app reminders before and after a due date.
const INBOX_OFFSETS: [i64; 3] = [14, 7, 1];

/// An assigned task with a due date, as read for the inbox pass.
#[derive(Debug, Clone, FromRow)]
pub struct TaskDeadline {
    pub task_id: i64,
    pub project_id: i64,
    pub assigned_to: i64,
    pub due_date: NaiveDate,
}

fn days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", n)
    }
}

/// The inbox entry for a task whose due date is 14, 7 or 1 days away, or
/// which has been overdue for 1, 7 or 14 days.
pub fn deadline_notice(task: &TaskDeadline, today: NaiveDate) -> Option<NotificationEvent> {
    let remaining = (task.due_date - today).num_days();
    let message = if INBOX_OFFSETS.contains(&remaining) {
        format!("You have a task due in {}", days(remaining))
    } else if INBOX_OFFSETS.contains(&-remaining) {
        format!("Your task is {} overdue", days(-remaining))
    } else {
        return None;
    };

    Some(NotificationEvent {
        data_type: "tasks",
        data_id: task.task_id,
        project_id: Some(task.project_id),
        message,
        link: format!("/projects/{}/tasks/{}", task.project_id, task.task_id),
    })
}

async fn task_deadlines(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<TaskDeadline>, sqlx::Error> {
    sqlx::query_as::<_, TaskDeadline>(
        "SELECT id AS task_id, project_id, assigned_to, due_date FROM tasks
         WHERE tenant_id = ? AND assigned_to IS NOT NULL AND due_date IS NOT NULL",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

async fn notice_exists(pool: &MySqlPool, event: &NotificationEvent) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_notifications
         WHERE notification_data_type = ? AND notification_data_id = ? AND notification_message = ?",
    )
    .bind(event.data_type)
    .bind(event.data_id)
    .bind(&event.message)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Writes the due-soon and overdue inbox entries of the tenant's tasks.
/// An entry already present for the same task and message is not repeated.
pub async fn post_deadline_notifications(
    pool: &MySqlPool,
    tenant_id: i64,
    today: NaiveDate,
) -> Result<ScheduledReport, NotifyError> {
    let tasks = task_deadlines(pool, tenant_id).await?;
    let mut report = ScheduledReport::default();

    for task in &tasks {
        let Some(event) = deadline_notice(task, today) else {
            continue;
        };
        let outcome = match notice_exists(pool, &event).await {
            Ok(true) => {
                report.already_sent += 1;
                continue;
            }
            Ok(false) => pool.add_notification(task.assigned_to, &event).await,
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(()) => report.sent += 1,
            Err(e) => {
                error!("Failed to post deadline notice for task {}: {}", task.task_id, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Deadline notices for tenant {}: {} posted, {} already posted, {} failed",
        tenant_id, report.sent, report.already_sent, report.failed
    );
    Ok(report)
}

/// Sends every reminder of the tenant that falls due today. Each channel of
/// each reminder is sent and recorded on its own, so a channel that already
/// went out is not repeated when another one failed.
pub async fn dispatch_scheduled_notifications(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    config: &Settings,
    tenant_id: i64,
    today: NaiveDate,
) -> Result<ScheduledReport, NotifyError> {
    let candidates = reminder_candidates(pool, tenant_id).await?;
    let mut report = ScheduledReport::default();

    for reminder in candidates.iter().filter_map(|c| reminder_for(c, today)) {
        for (channel, destination) in reminder.deliveries() {
            match already_sent(pool, &reminder, channel).await {
                Ok(true) => {
                    report.already_sent += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to check reminder ledger for user {}: {}", reminder.user_id, e);
                    report.failed += 1;
                    continue;
                }
            }
            match send_reminder(pool, notifier, config, &reminder, channel, destination).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    error!(
                        "Failed to send {} reminder to user {}: {}",
                        channel.as_str(),
                        reminder.user_id,
                        e
                    );
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        "Scheduled notifications for tenant {}: {} sent, {} already sent, {} failed",
        tenant_id, report.sent, report.already_sent, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(deadline: &str, due_date: NaiveDate) -> ReminderCandidate {
        ReminderCandidate {
            user_id: 5,
            email: "owner@example.com".into(),
            phone_no: Some("+15550199".into()),
            scheduled_email: true,
            scheduled_sms: false,
            upcoming_event_deadline: Some(deadline.into()),
            task_name: "Collect evidence".into(),
            due_date,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn deadlines_round_trip_through_their_names() {
        for deadline in [
            UpcomingEventDeadline::OneDayPrior,
            UpcomingEventDeadline::FiveDaysPrior,
            UpcomingEventDeadline::NinetyDaysPrior,
        ] {
            assert_eq!(UpcomingEventDeadline::parse(deadline.as_str()), Some(deadline));
            let json = serde_json::to_string(&deadline).unwrap();
            assert_eq!(json, format!("\"{}\"", deadline.as_str()));
        }
        assert_eq!(UpcomingEventDeadline::parse("tomorrow"), None);
    }

    #[test]
    fn reminder_fires_exactly_lead_time_before_due_date() {
        let c = candidate("seven_days_prior", date(2024, 3, 15));

        let reminder = reminder_for(&c, date(2024, 3, 8)).unwrap();
        assert_eq!(
            reminder,
            Reminder {
                user_id: 5,
                email: Some("owner@example.com".into()),
                phone_no: None,
                message: "A task Collect evidence you are assigned to is due in 7 days".into(),
            }
        );
        assert!(reminder_for(&c, date(2024, 3, 9)).is_none());
        assert!(reminder_for(&c, date(2024, 3, 15)).is_none());
    }

    #[test]
    fn disabled_channels_produce_no_reminder() {
        let mut c = candidate("one_day_prior", date(2024, 1, 2));
        c.scheduled_email = false;
        assert!(reminder_for(&c, date(2024, 1, 1)).is_none());

        c.scheduled_sms = true;
        let reminder = reminder_for(&c, date(2024, 1, 1)).unwrap();
        assert_eq!(reminder.email, None);
        assert_eq!(reminder.phone_no.as_deref(), Some("+15550199"));
    }

    #[test]
    fn unknown_deadline_is_skipped() {
        let c = candidate("whenever", date(2024, 1, 2));
        assert!(reminder_for(&c, date(2024, 1, 1)).is_none());
    }

    fn deadline(due_date: NaiveDate) -> TaskDeadline {
        TaskDeadline {
            task_id: 41,
            project_id: 3,
            assigned_to: 5,
            due_date,
        }
    }

    #[test]
    fn deadline_notices_fire_before_and_after_due_date() {
        let task = deadline(date(2024, 3, 15));
        let message = |today| deadline_notice(&task, today).map(|e| e.message);

        assert_eq!(message(date(2024, 3, 1)).as_deref(), Some("You have a task due in 14 days"));
        assert_eq!(message(date(2024, 3, 8)).as_deref(), Some("You have a task due in 7 days"));
        assert_eq!(message(date(2024, 3, 14)).as_deref(), Some("You have a task due in 1 day"));
        assert_eq!(message(date(2024, 3, 16)).as_deref(), Some("Your task is 1 day overdue"));
        assert_eq!(message(date(2024, 3, 22)).as_deref(), Some("Your task is 7 days overdue"));
        assert_eq!(message(date(2024, 3, 29)).as_deref(), Some("Your task is 14 days overdue"));

        for quiet in [date(2024, 3, 15), date(2024, 3, 10), date(2024, 3, 20), date(2024, 4, 1)] {
            assert_eq!(message(quiet), None, "{}", quiet);
        }
    }

    #[test]
    fn deadline_notice_links_to_the_task() {
        // crosses a month boundary
        let event = deadline_notice(&deadline(date(2024, 3, 3)), date(2024, 2, 25)).unwrap();
        assert_eq!(
            event,
            NotificationEvent {
                data_type: "tasks",
                data_id: 41,
                project_id: Some(3),
                message: "You have a task due in 7 days".into(),
                link: "/projects/3/tasks/41".into(),
            }
        );
    }

    #[test]
    fn reminder_lists_each_enabled_channel() {
        let mut c = candidate("one_day_prior", date(2024, 1, 2));
        c.scheduled_sms = true;
        let reminder = reminder_for(&c, date(2024, 1, 1)).unwrap();
        assert_eq!(
            reminder.deliveries(),
            vec![
                (ReminderChannel::Email, "owner@example.com"),
                (ReminderChannel::Sms, "+15550199"),
            ]
        );
    }

    mod database {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::db::test_support::{count, seed_task, seed_tenant};
        use async_trait::async_trait;
        use std::sync::Mutex;

        #[derive(Default)]
        struct FlakySms {
            emails: Mutex<Vec<String>>,
            sms_fails: bool,
        }

        #[async_trait]
        impl Notifier for FlakySms {
            async fn send_email(&self, email: &EmailMessage) -> Result<(), NotifyError> {
                self.emails.lock().unwrap().push(email.to.clone());
                Ok(())
            }

            async fn send_sms(&self, _sms: &SmsMessage) -> Result<(), NotifyError> {
                if self.sms_fails {
                    return Err(NotifyError::Transport {
                        channel: "sms",
                        reason: "gateway down".into(),
                    });
                }
                Ok(())
            }
        }

        fn config() -> Settings {
            Settings {
                database_url: String::new(),
                max_connections: 1,
                server_address: String::new(),
                frontend_server_url: String::new(),
                email_sender: "no-reply@localhost".into(),
                app_name: "GRC".into(),
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn deadline_notices_are_posted_once(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            let today = date(2024, 5, 1);
            let due_soon = seed_task(&pool, seed, "Collect evidence", Some(date(2024, 5, 8))).await;
            seed_task(&pool, seed, "Someday", Some(date(2024, 6, 30))).await;
            seed_task(&pool, seed, "Undated", None).await;

            let other = seed_tenant(&pool, "Globex").await;
            seed_task(&pool, other, "Not ours", Some(date(2024, 5, 8))).await;

            let first = post_deadline_notifications(&pool, seed.tenant_id, today).await.unwrap();
            assert_eq!(first, ScheduledReport { sent: 1, already_sent: 0, failed: 0 });
            let second = post_deadline_notifications(&pool, seed.tenant_id, today).await.unwrap();
            assert_eq!(second, ScheduledReport { sent: 0, already_sent: 1, failed: 0 });

            let (user_id, path, message): (i64, String, String) = sqlx::query_as(
                "SELECT user_id, notification_data_path, notification_message
                 FROM user_notifications WHERE notification_data_id = ?",
            )
            .bind(due_soon)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(user_id, seed.user_id);
            assert_eq!(path, format!("/projects/{}/tasks/{}", seed.project_id, due_soon));
            assert_eq!(message, "You have a task due in 7 days");
            assert_eq!(
                count(&pool, "SELECT COUNT(*) FROM user_notifications WHERE project_id = ?", other.project_id).await,
                0
            );
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn sent_email_is_not_repeated_after_sms_failure(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            seed_task(&pool, seed, "Collect evidence", Some(date(2024, 5, 2))).await;
            sqlx::query(
                "INSERT INTO user_notification_settings
                    (user_id, scheduled_email, scheduled_sms, upcoming_event_deadline)
                 VALUES (?, TRUE, TRUE, 'one_day_prior')",
            )
            .bind(seed.user_id)
            .execute(&pool)
            .await
            .unwrap();

            let notifier = FlakySms {
                sms_fails: true,
                ..Default::default()
            };
            let today = date(2024, 5, 1);

            let first = dispatch_scheduled_notifications(&pool, &notifier, &config(), seed.tenant_id, today)
                .await
                .unwrap();
            assert_eq!(first, ScheduledReport { sent: 1, already_sent: 0, failed: 1 });

            let second = dispatch_scheduled_notifications(&pool, &notifier, &config(), seed.tenant_id, today)
                .await
                .unwrap();
            assert_eq!(second, ScheduledReport { sent: 0, already_sent: 1, failed: 1 });
            assert_eq!(notifier.emails.lock().unwrap().len(), 1);
        }
    }
}
