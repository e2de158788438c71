//! Focus session records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A session counts as completed once it reaches 9/10 of its target.
const COMPLETION_NUM: u64 = 9;
const COMPLETION_DEN: u64 = 10;

pub const MS_PER_MINUTE: u64 = 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Manual,
    Pomodoro,
    Custom,
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionType::Manual => "manual",
            SessionType::Pomodoro => "pomodoro",
            SessionType::Custom => "custom",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SessionType::Manual),
            "pomodoro" => Ok(SessionType::Pomodoro),
            "custom" => Ok(SessionType::Custom),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Elapsed milliseconds; live while active, frozen once ended.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration: Option<u64>,
    #[serde(rename = "type")]
    pub kind: SessionType,
    /// Ids permitted for the whole session, captured at start.
    pub allowed_apps: Vec<String>,
    pub completed: bool,
    /// Automatic Pomodoro break; never counts toward the work cycle.
    #[serde(default)]
    pub is_break: bool,
}

impl FocusSession {
    pub(crate) fn begin(
        kind: SessionType,
        start_time: i64,
        target_duration: Option<u64>,
        allowed_apps: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            end_time: None,
            duration: 0,
            target_duration,
            kind,
            allowed_apps,
            completed: false,
            is_break: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn elapsed_at(&self, now_ms: i64) -> u64 {
        u64::try_from(now_ms.saturating_sub(self.start_time)).unwrap_or(0)
    }

    /// Milliseconds left before the target, zero once reached.
    pub fn remaining_at(&self, now_ms: i64) -> Option<u64> {
        self.target_duration
            .map(|target| target.saturating_sub(self.elapsed_at(now_ms)))
    }

    pub fn allows(&self, app_id: &str) -> bool {
        self.allowed_apps.iter().any(|id| id == app_id)
    }

    /// Freeze the session at `now_ms` and decide completion.
    pub(crate) fn finalize(&mut self, now_ms: i64) {
        self.duration = self.duration.max(self.elapsed_at(now_ms));
        self.end_time = Some(now_ms);
        self.completed = reaches_target(self.duration, self.target_duration);
    }
}

/// `duration >= 0.9 * target`; untimed sessions never complete.
pub fn reaches_target(duration_ms: u64, target_ms: Option<u64>) -> bool {
    match target_ms {
        Some(target) => {
            u128::from(duration_ms) * u128::from(COMPLETION_DEN)
                >= u128::from(target) * u128::from(COMPLETION_NUM)
        }
        None => false,
    }
}

pub fn minutes_to_ms(minutes: u32) -> u64 {
    u64::from(minutes) * MS_PER_MINUTE
}
