//! Focus settings, persisted as one record under `focus_settings`.

use serde::{Deserialize, Serialize};

use crate::config::{display_json, get_json_value_by_path, set_json_value_by_path};
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{read_json, KeyValueStore, SETTINGS_KEY};

/// User-tunable durations (minutes) and behaviour flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSettings {
    #[serde(default = "default_25")]
    pub default_duration: u32,
    #[serde(default = "default_25")]
    pub pomodoro_work_duration: u32,
    #[serde(default = "default_break")]
    pub pomodoro_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub pomodoro_long_break_duration: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub pomodoro_sessions_before_long_break: u32,
    #[serde(default)]
    pub allow_notifications: bool,
    /// Blocks ending a timed session before its target elapses.
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub auto_start_breaks: bool,
}

fn default_25() -> u32 {
    25
}
fn default_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            default_duration: default_25(),
            pomodoro_work_duration: default_25(),
            pomodoro_break_duration: default_break(),
            pomodoro_long_break_duration: default_long_break(),
            pomodoro_sessions_before_long_break: default_sessions_before_long_break(),
            allow_notifications: false,
            strict_mode: false,
            auto_start_breaks: false,
        }
    }
}

/// A partial update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub default_duration: Option<u32>,
    pub pomodoro_work_duration: Option<u32>,
    pub pomodoro_break_duration: Option<u32>,
    pub pomodoro_long_break_duration: Option<u32>,
    pub pomodoro_sessions_before_long_break: Option<u32>,
    pub allow_notifications: Option<bool>,
    pub strict_mode: Option<bool>,
    pub auto_start_breaks: Option<bool>,
}

impl FocusSettings {
    /// Stored settings, or defaults when nothing is stored yet.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(read_json(store, SETTINGS_KEY)?.unwrap_or_default())
    }

    /// Copy with every provided field of `patch` applied.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            default_duration: patch.default_duration.unwrap_or(self.default_duration),
            pomodoro_work_duration: patch
                .pomodoro_work_duration
                .unwrap_or(self.pomodoro_work_duration),
            pomodoro_break_duration: patch
                .pomodoro_break_duration
                .unwrap_or(self.pomodoro_break_duration),
            pomodoro_long_break_duration: patch
                .pomodoro_long_break_duration
                .unwrap_or(self.pomodoro_long_break_duration),
            pomodoro_sessions_before_long_break: patch
                .pomodoro_sessions_before_long_break
                .unwrap_or(self.pomodoro_sessions_before_long_break),
            allow_notifications: patch.allow_notifications.unwrap_or(self.allow_notifications),
            strict_mode: patch.strict_mode.unwrap_or(self.strict_mode),
            auto_start_breaks: patch.auto_start_breaks.unwrap_or(self.auto_start_breaks),
        }
    }

    /// Every duration and the long-break interval must be at least 1.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("defaultDuration", self.default_duration),
            ("pomodoroWorkDuration", self.pomodoro_work_duration),
            ("pomodoroBreakDuration", self.pomodoro_break_duration),
            ("pomodoroLongBreakDuration", self.pomodoro_long_break_duration),
            (
                "pomodoroSessionsBeforeLongBreak",
                self.pomodoro_sessions_before_long_break,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get one field by its persisted (camelCase) name.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        get_json_value_by_path(&json, key).map(display_json)
    }

    /// Copy with one field replaced, `value` parsed as that field's type.
    pub fn with_field(&self, key: &str, value: &str) -> Result<Self> {
        let mut json = serde_json::to_value(self)?;
        set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| {
            CoreError::Validation(ValidationError::InvalidValue {
                field: key.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(updated)
    }
}
