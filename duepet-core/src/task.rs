//! Task domain model
//!
//! Pure domain logic for schedule entries with no I/O operations.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::date::parse_iso_date;
use crate::error::{CoreError, Result};

/// Format used for the `start_time` and `end_time` fields
pub const TIME_FORMAT: &str = "%H:%M";

/// Format used for the `created_at` field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What area of life a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Study,
    Life,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Study => "study",
            Self::Life => "life",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(Self::Work),
            "study" => Ok(Self::Study),
            "life" => Ok(Self::Life),
            "other" => Ok(Self::Other),
            other => Err(CoreError::validation(
                "category",
                format!("unknown category '{}' (work, study, life, other)", other),
            )),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" => Ok(Self::High),
            "medium" | "med" | "m" => Ok(Self::Medium),
            "low" | "l" => Ok(Self::Low),
            other => Err(CoreError::validation(
                "priority",
                format!("unknown priority '{}' (high, medium, low)", other),
            )),
        }
    }
}

/// Repeat rule. Stored as metadata only, never expanded into occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Repeat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Repeat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(CoreError::validation(
                "repeat",
                format!("unknown repeat rule '{}' (none, daily, weekly, monthly)", other),
            )),
        }
    }
}

/// A single schedule entry, as persisted in the task file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: NaiveDate,
    /// "HH:MM", kept verbatim so a malformed value only affects reminders
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub repeat: Option<Repeat>,
    /// Minutes of lead time before the task starts
    #[serde(default)]
    pub reminder_time: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub overdue_penalized: bool,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Incomplete and due strictly before `today`
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date < today
    }

    /// Whether the overdue penalty should be applied on `today`
    pub fn needs_overdue_penalty(&self, today: NaiveDate) -> bool {
        self.is_overdue_on(today) && !self.overdue_penalized
    }
}

/// Fields supplied by the caller when creating a task.
///
/// `due_date` is raw text; it is validated when the task is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub repeat: Option<Repeat>,
    #[serde(default)]
    pub reminder_time: Option<u32>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            due_date: due_date.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_start_time(mut self, start: Option<String>) -> Self {
        self.start_time = start;
        self
    }

    pub fn with_end_time(mut self, end: Option<String>) -> Self {
        self.end_time = end;
        self
    }

    pub fn with_repeat(mut self, repeat: Option<Repeat>) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_reminder(mut self, minutes: Option<u32>) -> Self {
        self.reminder_time = minutes;
        self
    }

    /// Validate the fields and build a stored task
    pub fn into_task(self, id: String, created_at: NaiveDateTime) -> Result<Task> {
        let due_date = parse_iso_date(&self.due_date)?;

        Ok(Task {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority,
            due_date,
            start_time: self.start_time,
            end_time: self.end_time,
            repeat: self.repeat,
            reminder_time: self.reminder_time,
            completed: false,
            overdue_penalized: false,
            created_at,
        })
    }
}

/// Partial update of a task.
///
/// Every user-editable field can be set; `id`, `created_at` and
/// `overdue_penalized` are deliberately absent. Optional fields use
/// `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub start_time: Option<Option<String>>,
    pub end_time: Option<Option<String>>,
    pub repeat: Option<Option<Repeat>>,
    pub reminder_time: Option<Option<u32>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn start_time(mut self, start: Option<String>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn end_time(mut self, end: Option<String>) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn repeat(mut self, repeat: Option<Repeat>) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn reminder_time(mut self, minutes: Option<u32>) -> Self {
        self.reminder_time = Some(minutes);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into `task`
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(start) = &self.start_time {
            task.start_time = start.clone();
        }
        if let Some(end) = &self.end_time {
            task.end_time = end.clone();
        }
        if let Some(repeat) = self.repeat {
            task.repeat = repeat;
        }
        if let Some(minutes) = self.reminder_time {
            task.reminder_time = minutes;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(D::Error::custom)
    }
}
