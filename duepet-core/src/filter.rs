//! Task query filters
//!
//! Builder-style filter for the task list. All filters are optional and
//! AND-combined.

use chrono::NaiveDate;
use tracing::warn;

use crate::date::parse_iso_date;
use crate::task::{Category, Priority, Task};

/// Filter over stored tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    /// Inclusive lower bound on the due date
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on the due date
    pub to_date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_from(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn due_to(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }

    /// Inclusive due-date range
    pub fn between(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.due_from(from).due_to(to)
    }

    /// Set the lower bound from text. Unparsable text leaves the bound unset.
    pub fn due_from_text(mut self, input: &str) -> Self {
        match parse_iso_date(input) {
            Ok(date) => self.from_date = Some(date),
            Err(e) => warn!("ignoring start date filter: {e}"),
        }
        self
    }

    /// Set the upper bound from text. Unparsable text leaves the bound unset.
    pub fn due_to_text(mut self, input: &str) -> Self {
        match parse_iso_date(input) {
            Ok(date) => self.to_date = Some(date),
            Err(e) => warn!("ignoring end date filter: {e}"),
        }
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = Some(true);
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.completed = Some(false);
        self
    }

    pub fn with_completed(mut self, completed: Option<bool>) -> Self {
        self.completed = completed;
        self
    }

    /// Check if a task matches this query
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(category) = self.category {
            if task.category != category {
                return false;
            }
        }

        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }

        if let Some(from) = self.from_date {
            if task.due_date < from {
                return false;
            }
        }

        if let Some(to) = self.to_date {
            if task.due_date > to {
                return false;
            }
        }

        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }

        true
    }

    /// Apply the query, keeping the input order
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::NaiveDateTime;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn task(id: &str, due: &str, category: Category, priority: Priority) -> Task {
        NewTask::new(id, due)
            .with_category(category)
            .with_priority(priority)
            .into_task(id.to_string(), created())
            .unwrap()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("a", "2025-04-10", Category::Work, Priority::High),
            task("b", "2025-04-16", Category::Study, Priority::Medium),
            task("c", "2025-04-20", Category::Work, Priority::Low),
            task("d", "2025-05-01", Category::Life, Priority::High),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_empty_query_matches_all() {
        let tasks = sample();
        assert_eq!(TaskQuery::new().apply(&tasks).len(), 4);
    }

    #[test]
    fn test_filters_are_and_combined() {
        let tasks = sample();
        let query = TaskQuery::new()
            .in_category(Category::Work)
            .with_priority(Some(Priority::High));
        assert_eq!(ids(&query.apply(&tasks)), vec!["a"]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let tasks = sample();
        let query = TaskQuery::new().due_from_text("2025-04-16").due_to_text("2025-04-20");
        assert_eq!(ids(&query.apply(&tasks)), vec!["b", "c"]);
    }

    #[test]
    fn test_bad_date_filter_is_ignored() {
        let tasks = sample();
        let query = TaskQuery::new().due_from_text("16/04/2025").due_to_text("2025-04-16");
        assert_eq!(query.from_date, None);
        assert_eq!(ids(&query.apply(&tasks)), vec!["a", "b"]);
    }

    #[test]
    fn test_completed_filter() {
        let mut tasks = sample();
        tasks[2].completed = true;

        assert_eq!(ids(&TaskQuery::new().completed().apply(&tasks)), vec!["c"]);
        assert_eq!(
            ids(&TaskQuery::new().incomplete().apply(&tasks)),
            vec!["a", "b", "d"]
        );
    }
}
