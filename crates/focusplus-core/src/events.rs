use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::apps::AllowedApp;
use crate::engine::PendingBreak;
use crate::session::FocusSession;
use crate::settings::FocusSettings;

/// Every engine mutation produces exactly one Event.
/// Subscribers receive the state as it is after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session: FocusSession,
        /// Session that was running and got finalized to make room.
        superseded: Option<FocusSession>,
        at: DateTime<Utc>,
    },
    SessionEnded {
        session: FocusSession,
        scheduled_break: Option<PendingBreak>,
        at: DateTime<Utc>,
    },
    /// A scheduled Pomodoro break came due and is now running.
    BreakStarted {
        session: FocusSession,
        at: DateTime<Utc>,
    },
    /// A scheduled break was dropped by ending while idle.
    BreakCancelled {
        pending: PendingBreak,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: FocusSettings,
        at: DateTime<Utc>,
    },
    AllowedAppsChanged {
        apps: Vec<AllowedApp>,
        at: DateTime<Utc>,
    },
    /// All focus data was wiped and defaults restored.
    DataReset {
        settings: FocusSettings,
        apps: Vec<AllowedApp>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The running session after this event, if the event carries one.
    pub fn current_session(&self) -> Option<&FocusSession> {
        match self {
            Event::SessionStarted { session, .. } | Event::BreakStarted { session, .. } => {
                Some(session)
            }
            _ => None,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::SessionEnded { at, .. }
            | Event::BreakStarted { at, .. }
            | Event::BreakCancelled { at, .. }
            | Event::SettingsChanged { at, .. }
            | Event::AllowedAppsChanged { at, .. }
            | Event::DataReset { at, .. } => *at,
        }
    }
}
