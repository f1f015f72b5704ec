//! Virtual pet morale model
//!
//! The pet's health rises when tasks are completed and drops when tasks go
//! overdue, get reopened, or time passes. Food only moves with completions
//! and reopens. Rendering lives elsewhere; this is only the state.

use serde::{Deserialize, Serialize};

pub const MAX_STAT: u8 = 100;

/// Health above this keeps the pet happy
const HAPPY_ABOVE: u8 = 60;

/// Pet mood, derived from health except for `Angry`, which a reopened task
/// sets until health next changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Normal,
    Happy,
    Grumpy,
    Angry,
}

impl Mood {
    pub fn for_hp(hp: u8) -> Self {
        if hp > HAPPY_ABOVE {
            Self::Happy
        } else {
            Self::Grumpy
        }
    }
}

/// Tunables for how tasks affect the pet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRules {
    pub completion_bonus: u8,
    pub completion_food: u8,
    pub overdue_penalty: u8,
    /// Health and food lost when a completed task is marked open again
    pub reopen_hp_penalty: u8,
    pub reopen_food_penalty: u8,
    /// Health never drops below this through penalties or decay
    pub floor: u8,
    pub decay_amount: u8,
}

impl Default for PetRules {
    fn default() -> Self {
        Self {
            completion_bonus: 10,
            completion_food: 15,
            overdue_penalty: 15,
            reopen_hp_penalty: 5,
            reopen_food_penalty: 5,
            floor: 5,
            decay_amount: 5,
        }
    }
}

/// Persisted pet state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetState {
    #[serde(default = "full")]
    pub hp: u8,
    #[serde(default = "full")]
    pub food: u8,
    #[serde(default)]
    pub mood: Mood,
}

fn full() -> u8 {
    MAX_STAT
}

impl Default for PetState {
    fn default() -> Self {
        Self {
            hp: MAX_STAT,
            food: MAX_STAT,
            mood: Mood::Normal,
        }
    }
}

impl PetState {
    /// Set health, clamped to 0..=100. Returns whether anything changed.
    pub fn set_hp(&mut self, hp: u8) -> bool {
        let hp = hp.min(MAX_STAT);
        let mood = Mood::for_hp(hp);
        if hp == self.hp && mood == self.mood {
            return false;
        }
        self.hp = hp;
        self.mood = mood;
        true
    }

    fn set_food(&mut self, food: u8) -> bool {
        let food = food.min(MAX_STAT);
        let changed = food != self.food;
        self.food = food;
        changed
    }

    /// A task was completed
    pub fn reward(&mut self, rules: &PetRules) -> bool {
        let fed = self.set_food(self.food.saturating_add(rules.completion_food));
        self.set_hp(self.hp.saturating_add(rules.completion_bonus)) | fed
    }

    /// A completed task was reopened. Always leaves the pet angry.
    pub fn reopen(&mut self, rules: &PetRules) -> bool {
        let hp = self.hp.saturating_sub(rules.reopen_hp_penalty).max(rules.floor);
        let food = self.food.saturating_sub(rules.reopen_food_penalty);
        let changed = hp != self.hp || food != self.food || self.mood != Mood::Angry;
        self.hp = hp;
        self.food = food;
        self.mood = Mood::Angry;
        changed
    }

    /// A task went overdue
    pub fn penalize(&mut self, rules: &PetRules) -> bool {
        self.set_hp(self.hp.saturating_sub(rules.overdue_penalty).max(rules.floor))
    }

    /// Periodic decay, only while above the floor
    pub fn decay(&mut self, rules: &PetRules) -> bool {
        if self.hp <= rules.floor {
            return false;
        }
        self.set_hp(self.hp.saturating_sub(rules.decay_amount).max(rules.floor))
    }
}
