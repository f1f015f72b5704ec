//! Reminder instant computation

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::error::{CoreError, Result};
use crate::task::{TIME_FORMAT, Task};

/// Parse an "HH:MM" time-of-day field
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), TIME_FORMAT)
        .map_err(|e| CoreError::parse_with_source(format!("Invalid time '{}'", input), e))
}

/// The instant a task should notify: due date plus start time (or midnight)
/// minus the lead minutes. `Ok(None)` when the task has no reminder set.
pub fn reminder_instant(task: &Task) -> Result<Option<NaiveDateTime>> {
    let Some(lead) = task.reminder_time else {
        return Ok(None);
    };

    let start = match task.start_time.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_time_of_day(raw)?,
        None => NaiveTime::MIN,
    };

    task.due_date
        .and_time(start)
        .checked_sub_signed(Duration::minutes(i64::from(lead)))
        .map(Some)
        .ok_or_else(|| CoreError::parse(format!("Reminder for '{}' is out of range", task.title)))
}

/// Whether an incomplete task's reminder instant falls in `[now, now + window]`
pub fn is_reminder_due(task: &Task, now: NaiveDateTime, window_minutes: u32) -> Result<bool> {
    if task.completed {
        return Ok(false);
    }

    let Some(instant) = reminder_instant(task)? else {
        return Ok(false);
    };

    let horizon = now + Duration::minutes(i64::from(window_minutes));
    Ok(now <= instant && instant <= horizon)
}
