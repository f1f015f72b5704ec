//! Normalization of raw assignment records into new tasks
//!
//! Records come from an external scraper; this module only knows their
//! four fields, never how they were obtained.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::date::{DATE_FORMAT, parse_fuzzy_date};
use crate::task::{Category, NewTask, Priority};

const UNKNOWN_COURSE: &str = "unknown course";

/// One assignment as produced by the import adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAssignment {
    pub title: String,
    /// Free-form due date text as shown on the portal
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
}

/// What to do with one raw record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDecision {
    Add(NewTask),
    /// The resolved due date is already behind us
    SkipPast { title: String, due: NaiveDate },
}

/// Resolve free-form due text to a date, falling back to `today` when the
/// text is missing or cannot be read as a date.
pub fn resolve_due_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return today;
    };

    match parse_fuzzy_date(text, today) {
        Some(date) => date,
        None => {
            warn!("could not parse due date '{}', using today", text);
            today
        }
    }
}

impl RawAssignment {
    /// Decide whether this record becomes a task
    pub fn normalize(&self, today: NaiveDate) -> ImportDecision {
        let due = resolve_due_date(self.due_date.as_deref(), today);

        if due < today {
            return ImportDecision::SkipPast {
                title: self.title.clone(),
                due,
            };
        }

        ImportDecision::Add(
            NewTask::new(self.title.clone(), due.format(DATE_FORMAT).to_string())
                .with_category(Category::Study)
                .with_priority(Priority::Medium)
                .with_description(self.description()),
        )
    }

    fn description(&self) -> String {
        let course = self
            .course_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_COURSE);

        match self.link.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(link) => format!("Imported from course portal, course: {} link: {}", course, link),
            None => format!("Imported from course portal, course: {}", course),
        }
    }
}
