//! Reminder scheduler background loop.
//!
//! Runs on its own thread. Every tick it asks the [`TickDispatcher`] which
//! jobs are due: the daily reset (once at startup, then daily at the
//! configured time) sweeps overdue tasks, and the reminder scan emits one
//! [`ReminderEvent::Due`] per task whose reminder falls inside the lookahead
//! window. Events are not deduplicated between scans.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use duepet_core::Task;

use crate::config::ReminderSettings;
use crate::error::Result;
use crate::scheduler::cadence::{Cadence, TickDispatcher};
use crate::store::TaskStore;

/// Sent from the scheduler thread to whoever consumes reminders
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderEvent {
    /// The task's reminder falls inside the lookahead window
    Due(Task),
    /// Result of the daily reset
    DailyDigest {
        date: NaiveDate,
        due_today: usize,
        newly_overdue: usize,
    },
}

/// Loop timing
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub tick: Duration,
    pub scan_every: Duration,
    pub lookahead_minutes: u32,
    pub daily_reset_at: NaiveTime,
    /// Upper bound on how long `stop` waits for the thread
    pub stop_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            scan_every: Duration::from_secs(60),
            lookahead_minutes: 30,
            daily_reset_at: NaiveTime::MIN,
            stop_timeout: Duration::from_secs(2),
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(config: &ReminderSettings) -> Result<Self> {
        Ok(Self {
            tick: config.tick_interval(),
            scan_every: config.scan_interval(),
            lookahead_minutes: config.lookahead_minutes,
            daily_reset_at: config.daily_reset_time()?,
            stop_timeout: config.stop_timeout(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    DailyReset,
    ReminderScan,
}

struct Running {
    handle: JoinHandle<()>,
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
}

/// Owns the background reminder thread
pub struct ReminderScheduler {
    store: Arc<TaskStore>,
    settings: SchedulerSettings,
    events: mpsc::UnboundedSender<ReminderEvent>,
    running: Option<Running>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<TaskStore>,
        settings: SchedulerSettings,
        events: mpsc::UnboundedSender<ReminderEvent>,
    ) -> Self {
        Self {
            store,
            settings,
            events,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Start the loop. Returns false when it is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("reminder scheduler already running");
            return false;
        }

        // A loop that exited on its own (closed channel) is reaped here
        if let Some(finished) = self.running.take() {
            if finished.handle.join().is_err() {
                error!("previous reminder loop panicked");
            }
        }

        let (stop_tx, stop_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        let worker = Worker {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
            events: self.events.clone(),
        };

        let spawned = thread::Builder::new()
            .name("reminder-scheduler".to_string())
            .spawn(move || {
                worker.run(&stop_rx);
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                self.running = Some(Running {
                    handle,
                    stop_tx,
                    done_rx,
                });
                true
            }
            Err(e) => {
                error!("cannot spawn reminder thread: {e}");
                false
            }
        }
    }

    /// Ask the loop to stop and wait up to the stop timeout for it. When the
    /// wait runs out the thread is left to finish on its own. Returns false
    /// when nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };

        let _ = running.stop_tx.try_send(());
        match running.done_rx.recv_timeout(self.settings.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if running.handle.join().is_err() {
                    error!("reminder loop panicked");
                }
                info!("reminder scheduler stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "reminder loop did not stop within {:?}, detaching",
                    self.settings.stop_timeout
                );
            }
        }
        true
    }

    /// Set a task's reminder to `minutes_before` its start. The next scan
    /// picks it up.
    pub fn add_one_time_reminder(&self, id: &str, minutes_before: u32) -> bool {
        self.store.set_reminder(id, minutes_before)
    }

    /// Clear a task's reminder. False when the task is unknown or has none.
    pub fn remove_reminder(&self, id: &str) -> bool {
        self.store.clear_reminder(id)
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    store: Arc<TaskStore>,
    settings: SchedulerSettings,
    events: mpsc::UnboundedSender<ReminderEvent>,
}

impl Worker {
    fn dispatcher(&self) -> TickDispatcher<Job> {
        let scan_every = chrono::Duration::from_std(self.settings.scan_every)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let mut dispatcher = TickDispatcher::new();
        dispatcher.register(Job::DailyReset, Cadence::DailyAt(self.settings.daily_reset_at));
        dispatcher.register(Job::ReminderScan, Cadence::Every(scan_every));
        dispatcher
    }

    fn run(&self, stop_rx: &Receiver<()>) {
        let mut dispatcher = self.dispatcher();
        info!(
            "reminder scheduler started, {} jobs, tick {:?}",
            dispatcher.len(),
            self.settings.tick
        );

        loop {
            let now = Local::now().naive_local();
            if self.tick(&mut dispatcher, now).is_break() {
                return;
            }

            match stop_rx.recv_timeout(self.settings.tick) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("reminder loop received stop");
                    return;
                }
            }
        }
    }

    /// Run every job that is due at `now`. Breaks when the event channel
    /// has been closed.
    fn tick(&self, dispatcher: &mut TickDispatcher<Job>, now: NaiveDateTime) -> ControlFlow<()> {
        for job in dispatcher.due(now) {
            match job {
                Job::DailyReset => self.daily_reset(now)?,
                Job::ReminderScan => self.scan(now)?,
            }
        }
        ControlFlow::Continue(())
    }

    fn daily_reset(&self, now: NaiveDateTime) -> ControlFlow<()> {
        let newly_overdue = self.store.sweep_overdue(now);
        let due_today = self
            .store
            .today_at(now.date())
            .iter()
            .filter(|t| !t.completed)
            .count();
        info!(
            "daily reset: {} open tasks due today, {} newly overdue",
            due_today, newly_overdue
        );

        self.emit(ReminderEvent::DailyDigest {
            date: now.date(),
            due_today,
            newly_overdue,
        })
    }

    fn scan(&self, now: NaiveDateTime) -> ControlFlow<()> {
        let due = self
            .store
            .upcoming_reminders_at(now, self.settings.lookahead_minutes);
        if !due.is_empty() {
            debug!("{} reminders due", due.len());
        }

        for task in due {
            self.emit(ReminderEvent::Due(task))?;
        }
        ControlFlow::Continue(())
    }

    fn emit(&self, event: ReminderEvent) -> ControlFlow<()> {
        if self.events.send(event).is_err() {
            debug!("reminder channel closed, stopping");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}
