//! duepet core - pure domain logic for scheduling
//!
//! This crate contains no I/O operations. Persistence, threads and
//! notifications are handled by the `duepet` crate.

pub mod date;
pub mod error;
pub mod filter;
pub mod import;
pub mod pet;
pub mod reminder;
pub mod task;

pub use error::{CoreError, Result};
pub use filter::TaskQuery;
pub use import::{ImportDecision, RawAssignment};
pub use pet::{Mood, PetRules, PetState};
pub use task::{Category, NewTask, Priority, Repeat, Task, TaskPatch};
