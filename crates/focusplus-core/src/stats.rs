//! Daily totals derived from session history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::FocusSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sessions: usize,
    pub completed: usize,
    pub total_focus_ms: u64,
    /// `completed / sessions`, 0.0 for an empty day.
    pub completion_rate: f64,
}

impl DailySummary {
    pub fn from_sessions(date: NaiveDate, sessions: &[FocusSession]) -> Self {
        let completed = completed_count(sessions);
        let completion_rate = if sessions.is_empty() {
            0.0
        } else {
            completed as f64 / sessions.len() as f64
        };
        Self {
            date,
            sessions: sessions.len(),
            completed,
            total_focus_ms: total_duration(sessions),
            completion_rate,
        }
    }
}

pub fn total_duration(sessions: &[FocusSession]) -> u64 {
    sessions.iter().map(|s| s.duration).sum()
}

pub fn completed_count(sessions: &[FocusSession]) -> usize {
    sessions.iter().filter(|s| s.completed).count()
}

/// `1h 5m`, `12m 30s` or `45s`.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining_seconds = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {remaining_seconds}s")
    } else {
        format!("{remaining_seconds}s")
    }
}
