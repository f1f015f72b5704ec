//! Background reminder scheduling

pub mod cadence;
pub mod runner;

pub use cadence::{Cadence, TickDispatcher};
pub use runner::{ReminderEvent, ReminderScheduler, SchedulerSettings};
