//! Centralized configuration for duepet
//!
//! Loaded with `confy`; every value has a default so a partial or missing
//! config file works.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use duepet_core::PetRules;
use duepet_core::date::parse_weekday;
use duepet_core::reminder::parse_time_of_day;

use crate::error::{DuepetError, Result};

/// Application name used for the config and data directories
pub const APP_NAME: &str = "duepet";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the task and pet files
    pub data_directory: String,
    pub task_filename: String,
    pub pet_filename: String,
    /// First day of the week for the weekly view
    pub week_start: String,
    pub reminder: ReminderSettings,
    pub pet: PetSettings,
    pub portal: PortalSettings,
}

impl Default for Config {
    fn default() -> Self {
        let data_directory = ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());

        Self {
            data_directory,
            task_filename: "tasks.json".to_string(),
            pet_filename: "pet_state.json".to_string(),
            week_start: "monday".to_string(),
            reminder: ReminderSettings::default(),
            pet: PetSettings::default(),
            portal: PortalSettings::default(),
        }
    }
}

impl Config {
    /// Load from the platform config directory
    pub fn load() -> Result<Self> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn tasks_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join(&self.task_filename)
    }

    pub fn pet_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join(&self.pet_filename)
    }

    pub fn week_start(&self) -> Result<Weekday> {
        parse_weekday(&self.week_start).ok_or_else(|| {
            DuepetError::config(format!("unknown week_start '{}'", self.week_start))
        })
    }
}

/// Reminder loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// How often the loop wakes up (milliseconds)
    pub tick_interval_ms: u64,
    /// How often tasks are scanned for reminders (seconds)
    pub scan_interval_secs: u64,
    /// Reminders due within this many minutes are raised
    pub lookahead_minutes: u32,
    /// Wall-clock time of the daily reset, "HH:MM"
    pub daily_reset_at: String,
    /// How long `stop` waits for the loop to exit (milliseconds)
    pub stop_timeout_ms: u64,
    /// Show desktop notifications for reminders
    pub notify_desktop: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            scan_interval_secs: 60,
            lookahead_minutes: 30,
            daily_reset_at: "00:00".to_string(),
            stop_timeout_ms: 2000,
            notify_desktop: true,
        }
    }
}

impl ReminderSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn daily_reset_time(&self) -> Result<NaiveTime> {
        Ok(parse_time_of_day(&self.daily_reset_at)?)
    }
}

/// Pet morale settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PetSettings {
    pub completion_bonus: u8,
    pub completion_food: u8,
    pub overdue_penalty: u8,
    pub reopen_hp_penalty: u8,
    pub reopen_food_penalty: u8,
    pub floor: u8,
    pub decay_amount: u8,
    /// Seconds between decay steps while `watch` runs
    pub decay_interval_secs: u64,
}

impl Default for PetSettings {
    fn default() -> Self {
        let rules = PetRules::default();
        Self {
            completion_bonus: rules.completion_bonus,
            completion_food: rules.completion_food,
            overdue_penalty: rules.overdue_penalty,
            reopen_hp_penalty: rules.reopen_hp_penalty,
            reopen_food_penalty: rules.reopen_food_penalty,
            floor: rules.floor,
            decay_amount: rules.decay_amount,
            decay_interval_secs: 60,
        }
    }
}

impl PetSettings {
    pub fn rules(&self) -> PetRules {
        PetRules {
            completion_bonus: self.completion_bonus,
            completion_food: self.completion_food,
            overdue_penalty: self.overdue_penalty,
            reopen_hp_penalty: self.reopen_hp_penalty,
            reopen_food_penalty: self.reopen_food_penalty,
            floor: self.floor,
            decay_amount: self.decay_amount,
        }
    }

    pub fn decay_interval(&self) -> Duration {
        Duration::from_secs(self.decay_interval_secs.max(1))
    }
}

/// Course portal account used by the external scraper. Stored here so the
/// scraper and the app share one settings file; the engine never reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub browser_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.task_filename, "tasks.json");
        assert_eq!(config.week_start().unwrap(), Weekday::Mon);
        assert_eq!(config.reminder.lookahead_minutes, 30);
        assert_eq!(config.reminder.tick_interval(), Duration::from_secs(1));
        assert_eq!(
            config.reminder.daily_reset_time().unwrap(),
            NaiveTime::MIN
        );
        assert_eq!(config.pet.rules(), PetRules::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"week_start": "sunday", "reminder": {"lookahead_minutes": 10}}"#,
        )
        .unwrap();

        assert_eq!(config.week_start().unwrap(), Weekday::Sun);
        assert_eq!(config.reminder.lookahead_minutes, 10);
        assert_eq!(config.reminder.scan_interval_secs, 60);
        assert_eq!(config.pet_filename, "pet_state.json");
    }

    #[test]
    fn test_bad_week_start() {
        let config = Config {
            week_start: "someday".to_string(),
            ..Config::default()
        };
        assert!(config.week_start().is_err());
    }

    #[test]
    fn test_portal_section_is_optional() {
        let config: Config = serde_json::from_str(
            r#"{"portal": {"username": "2100012345", "browser_path": "/usr/bin/chromium"}}"#,
        )
        .unwrap();
        assert_eq!(config.portal.username.as_deref(), Some("2100012345"));
        assert_eq!(config.portal.nickname, None);

        assert!(Config::default().portal.username.is_none());
    }

    #[test]
    fn test_paths_join_data_directory() {
        let config = Config {
            data_directory: "/tmp/duepet".to_string(),
            ..Config::default()
        };
        assert_eq!(config.tasks_path(), PathBuf::from("/tmp/duepet/tasks.json"));
        assert_eq!(config.pet_path(), PathBuf::from("/tmp/duepet/pet_state.json"));
    }
}
