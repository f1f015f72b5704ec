//! duepet: task store, reminder scheduler and pet morale
//!
//! The domain types live in `duepet-core`; this crate adds persistence,
//! the background reminder loop and configuration.

pub mod config;
pub mod error;
pub mod notify;
pub mod pet;
pub mod scheduler;
pub mod storage;
pub mod store;

pub use error::{DuepetError, Result};
pub use pet::PetMorale;
pub use scheduler::{ReminderEvent, ReminderScheduler, SchedulerSettings};
pub use storage::JsonStorage;
pub use store::{ImportReport, TaskObserver, TaskStore};
