//! Task store
//!
//! Authoritative, mutex-guarded holder of all tasks. Every mutation rewrites
//! the JSON snapshot before returning. A failed write is logged and the
//! in-memory state stays authoritative; the next mutation writes everything
//! again.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound, Weekday};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use duepet_core::date::{month_range, week_range};
use duepet_core::import::{ImportDecision, RawAssignment};
use duepet_core::reminder::is_reminder_due;
use duepet_core::{NewTask, Task, TaskPatch, TaskQuery};

use crate::error::Result;
use crate::storage::JsonStorage;

/// Receives task state transitions.
///
/// Called synchronously after the store has applied and persisted the
/// change. A panicking observer is caught and logged.
pub trait TaskObserver: Send + Sync {
    /// A task moved from incomplete to completed
    fn on_task_completed(&self, _task: &Task) {}

    /// A task was detected overdue for the first time
    fn on_task_overdue(&self, _task: &Task) {}

    /// A completed task was marked open again
    fn on_task_reopened(&self, _task: &Task) {}
}

/// Outcome of [`TaskStore::import_batch`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ids of the tasks that were created
    pub added: Vec<String>,
    /// Records dropped because their due date had passed
    pub skipped_past: usize,
    /// Records `add` refused
    pub failed: usize,
}

pub struct TaskStore {
    storage: JsonStorage,
    tasks: Mutex<Vec<Task>>,
    observer: Option<Arc<dyn TaskObserver>>,
    week_start: Weekday,
}

impl TaskStore {
    /// Load the task file, creating an empty one when it does not exist
    pub fn open(storage: JsonStorage) -> Result<Self> {
        let tasks = match storage.load::<Vec<Task>>()? {
            Some(tasks) => {
                info!("loaded {} tasks from {}", tasks.len(), storage.path().display());
                tasks
            }
            None => {
                match storage.save(&Vec::<Task>::new()) {
                    Ok(()) => info!("created task file {}", storage.path().display()),
                    Err(e) => error!("cannot create task file: {e}"),
                }
                Vec::new()
            }
        };

        Ok(Self {
            storage,
            tasks: Mutex::new(tasks),
            observer: None,
            week_start: Weekday::Mon,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// First day of the week used by [`TaskStore::this_week`]
    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn storage(&self) -> &JsonStorage {
        &self.storage
    }

    fn persist(&self, tasks: &[Task]) {
        match self.storage.save(tasks) {
            Ok(()) => debug!("saved {} tasks", tasks.len()),
            Err(e) => error!("cannot save tasks, keeping them in memory: {e}"),
        }
    }

    /// Create a task, returning its id. Fails when `due_date` is not a
    /// valid `YYYY-MM-DD` date.
    pub fn add(&self, fields: NewTask) -> Result<String> {
        let mut tasks = self.tasks.lock();

        let mut id = Uuid::new_v4().to_string();
        while tasks.iter().any(|t| t.id == id) {
            id = Uuid::new_v4().to_string();
        }

        let created_at = Local::now().naive_local().trunc_subsecs(0);
        let task = fields.into_task(id, created_at).inspect_err(|e| {
            error!("refusing to add task: {e}");
        })?;

        info!("added task '{}'", task.title);
        let id = task.id.clone();
        tasks.push(task);
        self.persist(&tasks);
        Ok(id)
    }

    /// Merge `patch` into the task. Returns false when the id is unknown.
    pub fn update(&self, id: &str, patch: &TaskPatch) -> bool {
        let mut tasks = self.tasks.lock();

        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            warn!("no task with id {}", id);
            return false;
        };

        patch.apply(task);
        info!("updated task '{}'", task.title);
        self.persist(&tasks);
        true
    }

    /// Remind `minutes_before` the task starts
    pub fn set_reminder(&self, id: &str, minutes_before: u32) -> bool {
        self.update(id, &TaskPatch::new().reminder_time(Some(minutes_before)))
    }

    /// Clear the reminder. False when the task is unknown or has none.
    pub fn clear_reminder(&self, id: &str) -> bool {
        match self.get(id) {
            Some(task) if task.reminder_time.is_some() => {
                self.update(id, &TaskPatch::new().reminder_time(None))
            }
            Some(task) => {
                debug!("task '{}' has no reminder", task.title);
                false
            }
            None => {
                warn!("no task with id {}", id);
                false
            }
        }
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut tasks = self.tasks.lock();

        let Some(pos) = tasks.iter().position(|t| t.id == id) else {
            warn!("no task with id {}", id);
            return false;
        };

        let removed = tasks.remove(pos);
        info!("deleted task '{}'", removed.title);
        self.persist(&tasks);
        true
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks.lock().iter().find(|t| t.id == id).cloned()
    }

    /// Find a task by full id or unique id prefix
    pub fn resolve_id(&self, prefix: &str) -> Option<String> {
        let tasks = self.tasks.lock();
        if let Some(task) = tasks.iter().find(|t| t.id == prefix) {
            return Some(task.id.clone());
        }

        let mut matches = tasks.iter().filter(|t| t.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task.id.clone()),
            _ => None,
        }
    }

    /// All tasks in insertion order
    pub fn all(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn query(&self, query: &TaskQuery) -> Vec<Task> {
        let tasks = self.tasks.lock();
        query.apply(tasks.iter()).into_iter().cloned().collect()
    }

    pub fn today(&self) -> Vec<Task> {
        self.today_at(Local::now().date_naive())
    }

    pub fn today_at(&self, today: NaiveDate) -> Vec<Task> {
        self.query(&TaskQuery::new().between(today, today))
    }

    pub fn this_week(&self) -> Vec<Task> {
        self.this_week_at(Local::now().date_naive())
    }

    pub fn this_week_at(&self, today: NaiveDate) -> Vec<Task> {
        let (start, end) = week_range(today, self.week_start);
        self.query(&TaskQuery::new().between(start, end))
    }

    pub fn this_month(&self) -> Vec<Task> {
        self.this_month_at(Local::now().date_naive())
    }

    pub fn this_month_at(&self, today: NaiveDate) -> Vec<Task> {
        let (start, end) = month_range(today);
        self.query(&TaskQuery::new().between(start, end))
    }

    /// Set the completion flag. The observer hears about real transitions
    /// only; re-marking a task with its current state is silent.
    pub fn mark_completed(&self, id: &str, completed: bool) -> bool {
        let changed = {
            let mut tasks = self.tasks.lock();

            let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
                warn!("no task with id {}", id);
                return false;
            };

            let was_completed = task.completed;
            task.completed = completed;
            info!(
                "marked task '{}' as {}",
                task.title,
                if completed { "done" } else { "open" }
            );
            let changed = (completed != was_completed).then(|| task.clone());
            self.persist(&tasks);
            changed
        };

        match changed {
            Some(task) if task.completed => {
                self.notify("completion", |observer| observer.on_task_completed(&task))
            }
            Some(task) => self.notify("reopen", |observer| observer.on_task_reopened(&task)),
            None => {}
        }
        true
    }

    pub fn upcoming_reminders(&self, window_minutes: u32) -> Vec<Task> {
        self.upcoming_reminders_at(Local::now().naive_local(), window_minutes)
    }

    /// Incomplete tasks whose reminder instant lies within
    /// `[now, now + window_minutes]`
    pub fn upcoming_reminders_at(&self, now: NaiveDateTime, window_minutes: u32) -> Vec<Task> {
        let tasks = self.tasks.lock();

        tasks
            .iter()
            .filter(|task| match is_reminder_due(task, now, window_minutes) {
                Ok(due) => due,
                Err(e) => {
                    warn!("skipping reminder for '{}': {e}", task.title);
                    false
                }
            })
            .cloned()
            .collect()
    }

    /// Penalize each incomplete task that is past due and has not been
    /// penalized yet. Returns how many tasks were newly penalized.
    pub fn sweep_overdue(&self, now: NaiveDateTime) -> usize {
        let today = now.date();

        let penalized: Vec<Task> = {
            let mut tasks = self.tasks.lock();
            let mut penalized = Vec::new();

            for task in tasks.iter_mut().filter(|t| t.needs_overdue_penalty(today)) {
                task.overdue_penalized = true;
                penalized.push(task.clone());
            }

            if !penalized.is_empty() {
                self.persist(&tasks);
            }
            penalized
        };

        for task in &penalized {
            info!("task '{}' is overdue (due {})", task.title, task.due_date);
            self.notify("overdue", |observer| observer.on_task_overdue(task));
        }

        penalized.len()
    }

    pub fn import_batch(&self, records: &[RawAssignment]) -> ImportReport {
        self.import_batch_at(records, Local::now().date_naive())
    }

    /// Turn raw assignment records into study tasks. Each record is handled
    /// on its own; one bad record never stops the batch.
    pub fn import_batch_at(&self, records: &[RawAssignment], today: NaiveDate) -> ImportReport {
        let mut report = ImportReport::default();

        for record in records {
            match record.normalize(today) {
                ImportDecision::Add(new_task) => match self.add(new_task) {
                    Ok(id) => report.added.push(id),
                    Err(e) => {
                        warn!("could not import '{}': {e}", record.title);
                        report.failed += 1;
                    }
                },
                ImportDecision::SkipPast { title, due } => {
                    info!("skipping '{}', due date {} has passed", title, due);
                    report.skipped_past += 1;
                }
            }
        }

        info!(
            "imported {} of {} records",
            report.added.len(),
            records.len()
        );
        report
    }

    /// Replace every task, e.g. after restoring a backup
    pub fn replace_all(&self, replacement: Vec<Task>) {
        let mut tasks = self.tasks.lock();
        *tasks = replacement;
        self.persist(&tasks);
    }

    fn notify(&self, what: &str, call: impl FnOnce(&dyn TaskObserver)) {
        let Some(observer) = self.observer.as_deref() else {
            return;
        };

        if panic::catch_unwind(AssertUnwindSafe(|| call(observer))).is_err() {
            error!("{} observer panicked", what);
        }
    }
}
