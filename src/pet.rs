//! Persisted pet morale, driven by task events

use parking_lot::Mutex;
use tracing::{info, warn};

use duepet_core::{PetRules, PetState, Task};

use crate::storage::JsonStorage;
use crate::store::TaskObserver;

/// Pet state that reacts to task completion and overdue detection
pub struct PetMorale {
    storage: JsonStorage,
    rules: PetRules,
    state: Mutex<PetState>,
}

impl PetMorale {
    /// Load the pet from disk. A missing or unreadable file starts a fresh pet.
    pub fn load(storage: JsonStorage, rules: PetRules) -> Self {
        let state = match storage.load::<PetState>() {
            Ok(Some(state)) => state,
            Ok(None) => PetState::default(),
            Err(e) => {
                warn!("cannot load pet state, starting fresh: {e}");
                PetState::default()
            }
        };

        Self {
            storage,
            rules,
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> PetState {
        self.state.lock().clone()
    }

    pub fn rules(&self) -> &PetRules {
        &self.rules
    }

    /// Periodic health loss. Returns the new health when it changed.
    pub fn decay(&self) -> Option<u8> {
        self.change(|state, rules| state.decay(rules))
    }

    fn change(&self, apply: impl FnOnce(&mut PetState, &PetRules) -> bool) -> Option<u8> {
        let mut state = self.state.lock();
        if !apply(&mut *state, &self.rules) {
            return None;
        }
        self.save(&state);
        Some(state.hp)
    }

    fn save(&self, state: &PetState) {
        if let Err(e) = self.storage.save(state) {
            warn!("cannot save pet state: {e}");
        }
    }
}

impl TaskObserver for PetMorale {
    fn on_task_completed(&self, task: &Task) {
        if let Some(hp) = self.change(|state, rules| state.reward(rules)) {
            info!("pet cheers for '{}', hp now {}", task.title, hp);
        }
    }

    fn on_task_overdue(&self, task: &Task) {
        if let Some(hp) = self.change(|state, rules| state.penalize(rules)) {
            info!("pet sulks over '{}', hp now {}", task.title, hp);
        }
    }

    fn on_task_reopened(&self, task: &Task) {
        if let Some(hp) = self.change(|state, rules| state.reopen(rules)) {
            info!("pet is angry that '{}' is open again, hp now {}", task.title, hp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskStore;
    use chrono::NaiveDate;
    use duepet_core::{Mood, NewTask};
    use std::sync::Arc;

    fn morale(dir: &tempfile::TempDir) -> PetMorale {
        PetMorale::load(
            JsonStorage::new(dir.path().join("pet_state.json")).without_backup(),
            PetRules::default(),
        )
    }

    #[test]
    fn test_fresh_pet() {
        let dir = tempfile::tempdir().unwrap();
        let pet = morale(&dir);
        assert_eq!(pet.snapshot(), PetState::default());
    }

    #[test]
    fn test_unreadable_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pet_state.json"), "not json").unwrap();
        assert_eq!(morale(&dir).snapshot().hp, 100);
    }

    #[test]
    fn test_store_events_move_hp() {
        let dir = tempfile::tempdir().unwrap();
        let pet = Arc::new(morale(&dir));
        let store = TaskStore::open(JsonStorage::new(dir.path().join("tasks.json")))
            .unwrap()
            .with_observer(pet.clone());

        store.add(NewTask::new("Late one", "2025-04-01")).unwrap();
        store.add(NewTask::new("Late two", "2025-04-02")).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        store.sweep_overdue(now);
        assert_eq!(pet.snapshot().hp, 70);

        let id = store.add(NewTask::new("Finish", "2025-04-20")).unwrap();
        store.mark_completed(&id, true);
        assert_eq!(pet.snapshot().hp, 80);

        // Persisted across loads
        assert_eq!(morale(&dir).snapshot().hp, 80);
    }

    #[test]
    fn test_complete_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let pet = Arc::new(morale(&dir));
        let store = TaskStore::open(JsonStorage::new(dir.path().join("tasks.json")))
            .unwrap()
            .with_observer(pet.clone());
        pet.decay();
        pet.decay();
        assert_eq!(pet.snapshot().hp, 90);

        let id = store.add(NewTask::new("Essay", "2025-04-20")).unwrap();
        store.mark_completed(&id, true);
        let after_done = pet.snapshot();
        assert_eq!((after_done.hp, after_done.food), (100, 100));

        store.mark_completed(&id, false);
        let after_reopen = pet.snapshot();
        assert_eq!((after_reopen.hp, after_reopen.food), (95, 95));
        assert_eq!(after_reopen.mood, Mood::Angry);

        // Still open, no second penalty
        store.mark_completed(&id, false);
        assert_eq!(pet.snapshot().food, 95);

        assert_eq!(morale(&dir).snapshot(), after_reopen);
    }

    #[test]
    fn test_decay_until_floor() {
        let dir = tempfile::tempdir().unwrap();
        let pet = morale(&dir);
        let mut last = None;
        while let Some(hp) = pet.decay() {
            last = Some(hp);
        }
        assert_eq!(last, Some(5));
        assert_eq!(pet.snapshot().hp, 5);
    }
}
