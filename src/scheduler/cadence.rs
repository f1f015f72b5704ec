//! Tick dispatcher for periodic jobs
//!
//! Jobs are registered with a cadence and handed back by [`TickDispatcher::due`]
//! once their next run time has been reached. Every job is due on the first
//! tick after registration.

use std::fmt;

use chrono::{Duration, NaiveDateTime, NaiveTime};

/// When a job repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Run every fixed interval
    Every(Duration),
    /// Run once a day at a wall-clock time
    DailyAt(NaiveTime),
}

impl Cadence {
    /// Next run time strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Self::Every(interval) => now + interval.max(Duration::seconds(1)),
            Self::DailyAt(at) => {
                let today = now.date().and_time(at);
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Every(interval) if interval.num_seconds() >= 60 => {
                write!(f, "every {} minutes", interval.num_minutes())
            }
            Self::Every(interval) => write!(f, "every {} seconds", interval.num_seconds()),
            Self::DailyAt(at) => write!(f, "daily at {}", at.format("%H:%M")),
        }
    }
}

#[derive(Debug)]
struct Entry<J> {
    job: J,
    cadence: Cadence,
    next_due: Option<NaiveDateTime>,
}

/// Registered periodic jobs and their next run times
#[derive(Debug)]
pub struct TickDispatcher<J> {
    entries: Vec<Entry<J>>,
}

impl<J> Default for TickDispatcher<J> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<J: Copy + fmt::Debug> TickDispatcher<J> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job: J, cadence: Cadence) {
        tracing::debug!("registered {:?} ({})", job, cadence);
        self.entries.push(Entry {
            job,
            cadence,
            next_due: None,
        });
    }

    /// Jobs whose run time has come, in registration order. Each returned job
    /// is rescheduled relative to `now`.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<J> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if entry.next_due.is_none_or(|at| now >= at) {
                due.push(entry.job);
                entry.next_due = Some(entry.cadence.next_after(now));
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Job {
        Reset,
        Scan,
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn dispatcher() -> TickDispatcher<Job> {
        let mut dispatcher = TickDispatcher::new();
        dispatcher.register(Job::Reset, Cadence::DailyAt(NaiveTime::MIN));
        dispatcher.register(Job::Scan, Cadence::Every(Duration::seconds(60)));
        dispatcher
    }

    #[test]
    fn test_everything_runs_on_first_tick() {
        let mut dispatcher = dispatcher();
        assert_eq!(dispatcher.due(at(10, 0, 0)), vec![Job::Reset, Job::Scan]);
        assert!(dispatcher.due(at(10, 0, 1)).is_empty());
    }

    #[test]
    fn test_interval_job() {
        let mut dispatcher = dispatcher();
        dispatcher.due(at(10, 0, 0));

        assert!(dispatcher.due(at(10, 0, 59)).is_empty());
        assert_eq!(dispatcher.due(at(10, 1, 0)), vec![Job::Scan]);
        assert!(dispatcher.due(at(10, 1, 59)).is_empty());
        assert_eq!(dispatcher.due(at(10, 2, 0)), vec![Job::Scan]);
    }

    #[test]
    fn test_daily_job_waits_for_midnight() {
        let mut dispatcher = dispatcher();
        dispatcher.due(at(23, 59, 0));

        let midnight = NaiveDate::from_ymd_opt(2025, 4, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(dispatcher.due(at(23, 59, 59)), Vec::<Job>::new());
        assert_eq!(dispatcher.due(midnight), vec![Job::Reset, Job::Scan]);
    }

    #[test]
    fn test_daily_later_today() {
        let cadence = Cadence::DailyAt(NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(cadence.next_after(at(9, 0, 0)), at(18, 30, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Cadence::Every(Duration::seconds(60)).to_string(),
            "every 1 minutes"
        );
        assert_eq!(Cadence::DailyAt(NaiveTime::MIN).to_string(), "daily at 00:00");
    }
}
