//! Desktop notifications for reminder events

use notify_rust::Notification;
use tracing::{debug, warn};

use crate::scheduler::ReminderEvent;

const SUMMARY: &str = "Duepet";

/// Notification text for an event, `None` when the event is not worth a popup
pub fn notification_body(event: &ReminderEvent) -> Option<String> {
    match event {
        ReminderEvent::Due(task) => {
            let when = match &task.start_time {
                Some(start) => format!("starts at {start}"),
                None => format!("is due {}", task.due_date),
            };
            Some(format!("'{}' {}", task.title, when))
        }
        ReminderEvent::DailyDigest {
            due_today,
            newly_overdue,
            ..
        } => {
            if *due_today == 0 && *newly_overdue == 0 {
                return None;
            }
            let mut body = format!("{} task(s) due today", due_today);
            if *newly_overdue > 0 {
                body.push_str(&format!(", {} went overdue", newly_overdue));
            }
            Some(body)
        }
    }
}

/// Show a desktop notification. Failures are logged, never raised.
pub fn show(event: &ReminderEvent) {
    let Some(body) = notification_body(event) else {
        return;
    };

    match Notification::new().summary(SUMMARY).body(&body).show() {
        Ok(_) => debug!("notified: {}", body),
        Err(e) => warn!("desktop notification failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use duepet_core::NewTask;

    #[test]
    fn test_due_body() {
        let day = NaiveDate::from_ymd_opt(2025, 4, 16).unwrap();
        let task = NewTask::new("Standup", "2025-04-16")
            .with_start_time(Some("09:00".to_string()))
            .into_task("id".to_string(), day.and_hms_opt(8, 0, 0).unwrap())
            .unwrap();

        assert_eq!(
            notification_body(&ReminderEvent::Due(task)).as_deref(),
            Some("'Standup' starts at 09:00")
        );
    }

    #[test]
    fn test_quiet_digest() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 16).unwrap();
        let quiet = ReminderEvent::DailyDigest {
            date,
            due_today: 0,
            newly_overdue: 0,
        };
        assert!(notification_body(&quiet).is_none());

        let busy = ReminderEvent::DailyDigest {
            date,
            due_today: 2,
            newly_overdue: 1,
        };
        assert_eq!(
            notification_body(&busy).as_deref(),
            Some("2 task(s) due today, 1 went overdue")
        );
    }
}
