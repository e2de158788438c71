//! Focus session engine.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` periodically so a
//! scheduled Pomodoro break can start.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active            start_session
//! Active -> Active          start_session (old session finalized first)
//! Active -> Idle            end_session
//! Idle -> Active (break)    tick, once a scheduled break is due
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::in_memory(Arc::new(SystemClock))?;
//! engine.start_session(SessionType::Pomodoro, None)?;
//! // In a loop:
//! engine.tick()?; // Returns Some(session) when a break starts
//! ```
//!
//! Every mutation first computes its writes, commits them as one batch, and
//! only then updates memory. A failed write leaves the engine as it was.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::apps::{self, AllowedApp};
use crate::bus::{NotificationBus, Subscription};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::history;
use crate::session::{minutes_to_ms, FocusSession, SessionType};
use crate::settings::{FocusSettings, SettingsPatch};
use crate::stats::{self, DailySummary};
use crate::storage::{
    is_focus_key, read_json, KeyValueStore, MemoryStore, StoreOp, ALLOWED_APPS_KEY,
    ENGINE_STATE_KEY, SETTINGS_KEY,
};

/// A break waiting to be started by `tick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBreak {
    /// Epoch milliseconds at which the break starts.
    pub due_at: i64,
    pub target_minutes: u32,
    pub long_break: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentSession {
    session: FocusSession,
    /// History bucket, taken from the clock's offset at start.
    started_on: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineState {
    #[serde(default)]
    current: Option<CurrentSession>,
    #[serde(default)]
    pending_break: Option<PendingBreak>,
    /// Completed Pomodoro work sessions since the last reset.
    #[serde(default)]
    pomodoro_count: u32,
}

pub struct FocusEngine {
    store: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    bus: NotificationBus,
    state: EngineState,
}

impl FocusEngine {
    /// Seed default settings and apps if absent, then restore any session
    /// left running by a previous process.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or seeded, or if the
    /// saved engine state is corrupt.
    pub fn init(
        store: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self> {
        let mut ops = Vec::new();
        if store.get(SETTINGS_KEY)?.is_none() {
            ops.push(StoreOp::set_json(SETTINGS_KEY, &FocusSettings::default())?);
        }
        if store.get(ALLOWED_APPS_KEY)?.is_none() {
            ops.push(StoreOp::set_json(ALLOWED_APPS_KEY, &apps::default_apps())?);
        }
        if !ops.is_empty() {
            store.apply(&ops)?;
        }

        let state: EngineState = read_json(store.as_ref(), ENGINE_STATE_KEY)?.unwrap_or_default();
        if let Some(current) = &state.current {
            debug!(session_id = %current.session.id, "restored active focus session");
        }

        Ok(Self {
            store,
            clock,
            config,
            bus: NotificationBus::new(),
            state,
        })
    }

    /// Engine over a [`MemoryStore`]; nothing outlives the process.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        Self::init(Box::new(MemoryStore::new()), clock, EngineConfig::default())
    }

    /// Drop every subscriber.
    ///
    /// Nothing is written: each command has already committed its state, and
    /// another process may have moved on since.
    pub fn dispose(self) {
        self.bus.clear();
    }

    /// Replace in-memory state with what is stored under
    /// `focus_engine_state`, picking up changes made by other processes.
    pub fn reload(&mut self) -> Result<()> {
        self.state = read_json(self.store.as_ref(), ENGINE_STATE_KEY)?.unwrap_or_default();
        Ok(())
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The running session with `duration` brought up to now.
    pub fn current_session(&self) -> Option<FocusSession> {
        let now_ms = self.clock.now_ms();
        self.state.current.as_ref().map(|current| {
            let mut session = current.session.clone();
            session.duration = session.duration.max(session.elapsed_at(now_ms));
            session
        })
    }

    pub fn is_in_focus_mode(&self) -> bool {
        self.state.current.is_some()
    }

    /// Every app is allowed while idle; during a session only the ids
    /// captured when it started.
    pub fn is_app_allowed(&self, app_id: &str) -> bool {
        match &self.state.current {
            Some(current) => current.session.allows(app_id),
            None => true,
        }
    }

    /// Milliseconds until the running session reaches its target.
    pub fn remaining_ms(&self) -> Result<Option<u64>> {
        let current = self.state.current.as_ref().ok_or(CoreError::NoActiveSession)?;
        Ok(current.session.remaining_at(self.clock.now_ms()))
    }

    pub fn pending_break(&self) -> Option<PendingBreak> {
        self.state.pending_break
    }

    pub fn pomodoro_count(&self) -> u32 {
        self.state.pomodoro_count
    }

    pub fn settings(&self) -> Result<FocusSettings> {
        FocusSettings::load(self.store.as_ref())
    }

    pub fn allowed_apps(&self) -> Result<Vec<AllowedApp>> {
        apps::load(self.store.as_ref())
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub fn today_sessions(&self) -> Result<Vec<FocusSession>> {
        self.sessions_on(self.today())
    }

    pub fn sessions_on(&self, date: NaiveDate) -> Result<Vec<FocusSession>> {
        history::load_day(self.store.as_ref(), date)
    }

    /// Sum of durations over today's finished sessions.
    pub fn total_focus_time(&self) -> Result<u64> {
        Ok(stats::total_duration(&self.today_sessions()?))
    }

    pub fn completed_session_count(&self) -> Result<usize> {
        Ok(stats::completed_count(&self.today_sessions()?))
    }

    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary> {
        Ok(DailySummary::from_sessions(date, &self.sessions_on(date)?))
    }

    /// One summary per date from `from` to `to`, both inclusive.
    pub fn summaries_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailySummary>> {
        if to < from {
            return Err(ValidationError::InvalidRange { from, to }.into());
        }
        from.iter_days()
            .take_while(|date| *date <= to)
            .map(|date| self.daily_summary(date))
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session, finalizing any session already running.
    ///
    /// Pomodoro sessions always use the configured work duration; other
    /// types use `target_minutes`, falling back to the default duration.
    /// Any scheduled break is cancelled.
    pub fn start_session(
        &mut self,
        kind: SessionType,
        target_minutes: Option<u32>,
    ) -> Result<FocusSession> {
        let settings = self.settings()?;
        let registry = self.allowed_apps()?;
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        let minutes = match kind {
            SessionType::Pomodoro => settings.pomodoro_work_duration,
            SessionType::Manual | SessionType::Custom => {
                target_minutes.unwrap_or(settings.default_duration)
            }
        };
        if minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "targetDuration".to_string(),
                message: "must be at least 1 minute".to_string(),
            }
            .into());
        }

        let mut next = self.state.clone();
        let mut ops = Vec::new();
        let superseded = match next.current.take() {
            Some(current) => Some(self.finalize(current, &settings, now_ms, &mut next, &mut ops)?),
            None => None,
        };
        next.pending_break = None;

        let session = FocusSession::begin(
            kind,
            now_ms,
            Some(minutes_to_ms(minutes)),
            apps::allowed_ids(&registry),
        );
        next.current = Some(CurrentSession {
            session: session.clone(),
            started_on: now.date_naive(),
        });
        self.commit(ops, next)?;

        info!(
            session_id = %session.id,
            kind = %kind,
            target_minutes = minutes,
            superseded = superseded.is_some(),
            "focus session started"
        );
        self.bus.emit(&Event::SessionStarted {
            session: session.clone(),
            superseded,
            at: utc(now),
        });
        Ok(session)
    }

    /// Finish the running session and record it.
    ///
    /// Returns `Ok(None)` when idle; in that case a scheduled break, if any,
    /// is cancelled instead and [`Event::BreakCancelled`] is emitted.
    ///
    /// # Errors
    /// [`CoreError::StrictModeActive`] if strict mode blocks ending early,
    /// [`CoreError::StorageUnavailable`] if the session cannot be recorded.
    pub fn end_session(&mut self) -> Result<Option<FocusSession>> {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        let Some(current) = self.state.current.clone() else {
            if let Some(pending) = self.state.pending_break {
                let next = EngineState {
                    pending_break: None,
                    ..self.state.clone()
                };
                self.commit(Vec::new(), next)?;
                debug!(due_at = pending.due_at, "scheduled break cancelled");
                self.bus.emit(&Event::BreakCancelled {
                    pending,
                    at: utc(now),
                });
            }
            return Ok(None);
        };

        let settings = self.settings()?;
        let mut next = self.state.clone();
        next.current = None;
        next.pending_break = None;
        let mut ops = Vec::new();
        let session = self.finalize(current, &settings, now_ms, &mut next, &mut ops)?;
        self.commit(ops, next)?;

        info!(
            session_id = %session.id,
            duration_ms = session.duration,
            completed = session.completed,
            "focus session ended"
        );
        self.bus.emit(&Event::SessionEnded {
            session: session.clone(),
            scheduled_break: self.state.pending_break,
            at: utc(now),
        });
        Ok(Some(session))
    }

    /// Refresh the running session and start a scheduled break once due.
    ///
    /// Returns the break session when one starts.
    pub fn tick(&mut self) -> Result<Option<FocusSession>> {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        if let Some(current) = self.state.current.as_mut() {
            let elapsed = current.session.elapsed_at(now_ms);
            current.session.duration = current.session.duration.max(elapsed);
        }

        let pending = match self.state.pending_break {
            Some(pending) if pending.due_at <= now_ms && self.state.current.is_none() => pending,
            _ => return Ok(None),
        };

        let registry = self.allowed_apps()?;
        let mut session = FocusSession::begin(
            SessionType::Pomodoro,
            now_ms,
            Some(minutes_to_ms(pending.target_minutes)),
            apps::all_ids(&registry),
        );
        session.is_break = true;

        let next = EngineState {
            current: Some(CurrentSession {
                session: session.clone(),
                started_on: now.date_naive(),
            }),
            pending_break: None,
            pomodoro_count: self.state.pomodoro_count,
        };
        self.commit(Vec::new(), next)?;

        info!(
            session_id = %session.id,
            target_minutes = pending.target_minutes,
            long_break = pending.long_break,
            "break started"
        );
        self.bus.emit(&Event::BreakStarted {
            session: session.clone(),
            at: utc(now),
        });
        Ok(Some(session))
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<FocusSettings> {
        let merged = self.settings()?.merged(patch);
        self.save_settings(merged)
    }

    /// Set one setting by its persisted name, e.g. `autoStartBreaks`.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<FocusSettings> {
        let updated = self.settings()?.with_field(key, value)?;
        self.save_settings(updated)
    }

    /// Change one app's flag. Sessions already running keep their snapshot.
    pub fn update_allowed_app(&mut self, app_id: &str, is_allowed: bool) -> Result<()> {
        let updated = apps::with_flag(&self.allowed_apps()?, app_id, is_allowed)?;
        self.apply(&[StoreOp::set_json(ALLOWED_APPS_KEY, &updated)?])?;

        debug!(app_id, is_allowed, "allowed app updated");
        self.bus.emit(&Event::AllowedAppsChanged {
            apps: updated,
            at: utc(self.clock.now()),
        });
        Ok(())
    }

    /// Delete every focus key and return to a fresh, idle engine.
    ///
    /// Always proceeds, strict mode or not. Other keys are left alone.
    pub fn reset_all_data(&mut self) -> Result<()> {
        let ops: Vec<StoreOp> = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| is_focus_key(key))
            .map(|key| StoreOp::Remove { key })
            .collect();
        self.apply(&ops)?;
        self.state = EngineState::default();

        info!(removed = ops.len(), "all focus data reset");
        self.bus.emit(&Event::DataReset {
            settings: self.settings()?,
            apps: self.allowed_apps()?,
            at: utc(self.clock.now()),
        });
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Freeze `current`, queue its history write, and update the Pomodoro
    /// cycle in `next`. Touches nothing outside its arguments.
    fn finalize(
        &self,
        current: CurrentSession,
        settings: &FocusSettings,
        now_ms: i64,
        next: &mut EngineState,
        ops: &mut Vec<StoreOp>,
    ) -> Result<FocusSession> {
        let CurrentSession {
            mut session,
            started_on,
        } = current;

        if settings.strict_mode && !session.is_break {
            if let Some(remaining_ms) = session.remaining_at(now_ms).filter(|ms| *ms > 0) {
                return Err(CoreError::StrictModeActive { remaining_ms });
            }
        }

        session.finalize(now_ms);
        ops.push(history::append_op(self.store.as_ref(), started_on, &session)?);

        next.pending_break = None;
        if session.completed && session.kind == SessionType::Pomodoro && !session.is_break {
            next.pomodoro_count += 1;
            if settings.auto_start_breaks {
                let every = settings.pomodoro_sessions_before_long_break.max(1);
                let long_break = next.pomodoro_count % every == 0;
                let delay = i64::try_from(self.config.break_start_delay_ms).unwrap_or(i64::MAX);
                next.pending_break = Some(PendingBreak {
                    due_at: now_ms.saturating_add(delay),
                    target_minutes: if long_break {
                        settings.pomodoro_long_break_duration
                    } else {
                        settings.pomodoro_break_duration
                    },
                    long_break,
                });
            }
        }
        Ok(session)
    }

    fn save_settings(&mut self, settings: FocusSettings) -> Result<FocusSettings> {
        settings.validate()?;
        self.apply(&[StoreOp::set_json(SETTINGS_KEY, &settings)?])?;

        debug!(?settings, "focus settings updated");
        self.bus.emit(&Event::SettingsChanged {
            settings: settings.clone(),
            at: utc(self.clock.now()),
        });
        Ok(settings)
    }

    /// Write `ops` plus the engine state, then adopt `next`.
    fn commit(&mut self, mut ops: Vec<StoreOp>, next: EngineState) -> Result<()> {
        ops.push(StoreOp::set_json(ENGINE_STATE_KEY, &next)?);
        self.apply(&ops)?;
        self.state = next;
        Ok(())
    }

    fn apply(&self, ops: &[StoreOp]) -> Result<()> {
        self.store.apply(ops).map_err(|err| {
            warn!(error = %err, writes = ops.len(), "focus store write failed");
            CoreError::from(err)
        })
    }
}

fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StorageError;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn clock() -> ManualClock {
        ManualClock::new(DateTime::parse_from_rfc3339("2024-05-06T09:00:00+02:00").unwrap())
    }

    fn engine(clock: &ManualClock) -> FocusEngine {
        FocusEngine::in_memory(Arc::new(clock.clone())).unwrap()
    }

    /// Memory store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Arc<AtomicBool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.apply(&[StoreOp::Set {
                key: key.into(),
                value: value.into(),
            }])
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.apply(&[StoreOp::Remove { key: key.into() }])
        }
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }
        fn apply(&self, ops: &[StoreOp]) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::WriteRejected("quota exceeded".into()));
            }
            self.inner.apply(ops)
        }
    }

    #[test]
    fn init_seeds_defaults() {
        let clock = clock();
        let engine = engine(&clock);
        assert!(engine.store().get(SETTINGS_KEY).unwrap().is_some());
        assert!(engine.store().get(ALLOWED_APPS_KEY).unwrap().is_some());
        assert!(!engine.is_in_focus_mode());
    }

    #[test]
    fn start_resolves_target_duration() {
        let clock = clock();
        let mut engine = engine(&clock);

        let s = engine.start_session(SessionType::Manual, None).unwrap();
        assert_eq!(s.target_duration, Some(25 * 60_000));

        let s = engine.start_session(SessionType::Custom, Some(40)).unwrap();
        assert_eq!(s.target_duration, Some(40 * 60_000));

        // Pomodoro ignores the requested minutes.
        let s = engine.start_session(SessionType::Pomodoro, Some(90)).unwrap();
        assert_eq!(s.target_duration, Some(25 * 60_000));
    }

    #[test]
    fn zero_minute_target_rejected() {
        let clock = clock();
        let mut engine = engine(&clock);
        assert!(matches!(
            engine.start_session(SessionType::Custom, Some(0)),
            Err(CoreError::Validation(_))
        ));
        assert!(!engine.is_in_focus_mode());
    }

    #[test]
    fn start_while_active_finalizes_previous() {
        let clock = clock();
        let mut engine = engine(&clock);
        let first = engine.start_session(SessionType::Manual, None).unwrap();
        clock.advance(Duration::minutes(5));
        let second = engine.start_session(SessionType::Custom, Some(10)).unwrap();

        let history = engine.today_sessions().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[0].end_time, Some(second.start_time));
        assert_eq!(history[0].duration, 5 * 60_000);
        assert_eq!(engine.current_session().unwrap().id, second.id);
    }

    #[test]
    fn end_when_idle_is_none() {
        let clock = clock();
        let mut engine = engine(&clock);
        assert!(engine.end_session().unwrap().is_none());
        assert!(matches!(engine.remaining_ms(), Err(CoreError::NoActiveSession)));
    }

    #[test]
    fn end_marks_completion() {
        let clock = clock();
        let mut engine = engine(&clock);

        engine.start_session(SessionType::Manual, Some(25)).unwrap();
        clock.advance(Duration::minutes(23));
        let done = engine.end_session().unwrap().unwrap();
        assert!(done.completed);

        engine.start_session(SessionType::Manual, Some(25)).unwrap();
        clock.advance(Duration::minutes(20));
        let cut = engine.end_session().unwrap().unwrap();
        assert!(!cut.completed);

        assert_eq!(engine.total_focus_time().unwrap(), 43 * 60_000);
        assert_eq!(engine.completed_session_count().unwrap(), 1);
    }

    #[test]
    fn duration_grows_while_active() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.start_session(SessionType::Manual, None).unwrap();
        let a = engine.current_session().unwrap().duration;
        clock.advance(Duration::seconds(1));
        let b = engine.current_session().unwrap().duration;
        engine.tick().unwrap();
        let c = engine.current_session().unwrap().duration;
        assert!(a <= b && b <= c);
        assert_eq!(b, 1000);
        assert_eq!(engine.remaining_ms().unwrap(), Some(25 * 60_000 - 1000));
    }

    #[test]
    fn app_snapshot_is_fixed_at_start() {
        let clock = clock();
        let mut engine = engine(&clock);
        assert!(engine.is_app_allowed("games"));

        engine.start_session(SessionType::Manual, None).unwrap();
        assert!(engine.is_app_allowed("email"));
        assert!(!engine.is_app_allowed("games"));

        engine.update_allowed_app("games", true).unwrap();
        engine.update_allowed_app("email", false).unwrap();
        assert!(!engine.is_app_allowed("games"));
        assert!(engine.is_app_allowed("email"));

        engine.end_session().unwrap();
        engine.start_session(SessionType::Manual, None).unwrap();
        assert!(engine.is_app_allowed("games"));
        assert!(!engine.is_app_allowed("email"));
    }

    #[test]
    fn unknown_app_is_an_error() {
        let clock = clock();
        let mut engine = engine(&clock);
        assert!(matches!(
            engine.update_allowed_app("solitaire", false),
            Err(CoreError::UnknownAppId(_))
        ));
    }

    #[test]
    fn pomodoro_schedules_short_then_long_breaks() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine
            .update_settings(&SettingsPatch {
                auto_start_breaks: Some(true),
                ..SettingsPatch::default()
            })
            .unwrap();

        for n in 1..=4 {
            engine.start_session(SessionType::Pomodoro, None).unwrap();
            clock.advance(Duration::minutes(25));
            engine.end_session().unwrap();
            let pending = engine.pending_break().unwrap();
            assert_eq!(engine.pomodoro_count(), n);
            if n == 4 {
                assert!(pending.long_break);
                assert_eq!(pending.target_minutes, 15);
            } else {
                assert!(!pending.long_break);
                assert_eq!(pending.target_minutes, 5);
            }
        }
    }

    #[test]
    fn due_break_starts_on_tick_with_every_app() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.set_setting("autoStartBreaks", "true").unwrap();

        engine.start_session(SessionType::Pomodoro, None).unwrap();
        clock.advance(Duration::minutes(25));
        engine.end_session().unwrap();

        assert!(engine.tick().unwrap().is_none());
        clock.advance(Duration::milliseconds(1000));
        let brk = engine.tick().unwrap().unwrap();
        assert!(brk.is_break);
        assert_eq!(brk.kind, SessionType::Pomodoro);
        assert_eq!(brk.target_duration, Some(5 * 60_000));
        assert!(engine.is_app_allowed("games"));
        assert!(engine.pending_break().is_none());

        // A finished break does not count as a work session.
        clock.advance(Duration::minutes(5));
        engine.end_session().unwrap();
        assert_eq!(engine.pomodoro_count(), 1);
        assert!(engine.pending_break().is_none());
    }

    #[test]
    fn explicit_start_cancels_scheduled_break() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.set_setting("autoStartBreaks", "true").unwrap();
        engine.start_session(SessionType::Pomodoro, None).unwrap();
        clock.advance(Duration::minutes(25));
        engine.end_session().unwrap();

        let manual = engine.start_session(SessionType::Manual, None).unwrap();
        clock.advance(Duration::seconds(5));
        assert!(engine.tick().unwrap().is_none());
        assert_eq!(engine.current_session().unwrap().id, manual.id);
    }

    #[test]
    fn idle_end_cancels_scheduled_break() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.set_setting("autoStartBreaks", "true").unwrap();
        engine.start_session(SessionType::Pomodoro, None).unwrap();
        clock.advance(Duration::minutes(25));
        engine.end_session().unwrap();
        assert!(engine.pending_break().is_some());

        assert!(engine.end_session().unwrap().is_none());
        assert!(engine.pending_break().is_none());
        clock.advance(Duration::seconds(5));
        assert!(engine.tick().unwrap().is_none());
    }

    #[test]
    fn idle_end_reports_cancelled_break() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.set_setting("autoStartBreaks", "true").unwrap();
        engine.start_session(SessionType::Pomodoro, None).unwrap();
        clock.advance(Duration::minutes(25));
        engine.end_session().unwrap();
        let scheduled = engine.pending_break().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        engine.subscribe(move |event| s.lock().unwrap().push(event.clone()));

        engine.end_session().unwrap();
        engine.end_session().unwrap();

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::BreakCancelled { pending, .. } if *pending == scheduled
        ));
    }

    #[test]
    fn stale_engine_does_not_resurrect_ended_session() {
        let clock = clock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusplus.db");
        let open = |clock: &ManualClock| {
            let store = crate::storage::SqliteStore::open(&path).unwrap();
            FocusEngine::init(Box::new(store), Arc::new(clock.clone()), EngineConfig::default())
                .unwrap()
        };

        let mut writer = open(&clock);
        let s = writer.start_session(SessionType::Manual, Some(25)).unwrap();
        let mut watcher = open(&clock);
        assert_eq!(watcher.current_session().unwrap().id, s.id);

        clock.advance(Duration::minutes(25));
        writer.end_session().unwrap();

        watcher.reload().unwrap();
        assert!(watcher.current_session().is_none());
        watcher.tick().unwrap();
        watcher.dispose();

        let mut next = open(&clock);
        assert!(next.current_session().is_none());
        assert!(next.end_session().unwrap().is_none());
        let history = next.today_sessions().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, s.id);
        assert_eq!(next.total_focus_time().unwrap(), 25 * 60_000);
    }

    #[test]
    fn dispose_without_reload_leaves_store_alone() {
        let clock = clock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusplus.db");
        let open = |clock: &ManualClock| {
            let store = crate::storage::SqliteStore::open(&path).unwrap();
            FocusEngine::init(Box::new(store), Arc::new(clock.clone()), EngineConfig::default())
                .unwrap()
        };

        let mut writer = open(&clock);
        writer.start_session(SessionType::Manual, None).unwrap();
        let stale = open(&clock);
        clock.advance(Duration::minutes(10));
        writer.end_session().unwrap();
        stale.dispose();

        let mut next = open(&clock);
        assert!(!next.is_in_focus_mode());
        assert!(next.end_session().unwrap().is_none());
        assert_eq!(next.today_sessions().unwrap().len(), 1);
    }

    #[test]
    fn no_break_without_auto_start() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.start_session(SessionType::Pomodoro, None).unwrap();
        clock.advance(Duration::minutes(25));
        engine.end_session().unwrap();
        assert_eq!(engine.pomodoro_count(), 1);
        assert!(engine.pending_break().is_none());
    }

    #[test]
    fn strict_mode_blocks_early_end() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.set_setting("strictMode", "true").unwrap();
        let s = engine.start_session(SessionType::Manual, Some(25)).unwrap();
        clock.advance(Duration::minutes(10));

        match engine.end_session() {
            Err(CoreError::StrictModeActive { remaining_ms }) => {
                assert_eq!(remaining_ms, 15 * 60_000)
            }
            other => panic!("expected StrictModeActive, got {other:?}"),
        }
        assert!(matches!(
            engine.start_session(SessionType::Manual, None),
            Err(CoreError::StrictModeActive { .. })
        ));
        assert_eq!(engine.current_session().unwrap().id, s.id);

        clock.advance(Duration::minutes(15));
        assert!(engine.end_session().unwrap().unwrap().completed);
    }

    #[test]
    fn reset_clears_focus_keys_only() {
        let clock = clock();
        let mut engine = engine(&clock);
        engine.store().set("screen_time_2024-05-06", "{}").unwrap();
        engine.set_setting("strictMode", "true").unwrap();
        engine.update_allowed_app("news", true).unwrap();
        engine.start_session(SessionType::Manual, None).unwrap();

        engine.reset_all_data().unwrap();

        let keys = engine.store().keys().unwrap();
        assert_eq!(keys, vec!["screen_time_2024-05-06".to_string()]);
        assert!(!engine.is_in_focus_mode());
        assert_eq!(engine.settings().unwrap(), FocusSettings::default());
        assert_eq!(engine.allowed_apps().unwrap(), apps::default_apps());
        assert_eq!(engine.pomodoro_count(), 0);
    }

    #[test]
    fn failed_write_keeps_state() {
        let clock = clock();
        let failing = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            inner: MemoryStore::new(),
            failing: Arc::clone(&failing),
        };
        let mut engine =
            FocusEngine::init(Box::new(store), Arc::new(clock.clone()), EngineConfig::default())
                .unwrap();
        let s = engine.start_session(SessionType::Manual, None).unwrap();
        clock.advance(Duration::minutes(25));

        failing.store(true, Ordering::SeqCst);
        assert!(matches!(
            engine.end_session(),
            Err(CoreError::StorageUnavailable(_))
        ));
        assert_eq!(engine.current_session().unwrap().id, s.id);
        assert!(matches!(
            engine.update_allowed_app("games", true),
            Err(CoreError::StorageUnavailable(_))
        ));

        failing.store(false, Ordering::SeqCst);
        let ended = engine.end_session().unwrap().unwrap();
        assert_eq!(ended.id, s.id);
        assert_eq!(engine.today_sessions().unwrap().len(), 1);
    }

    #[test]
    fn every_call_emits_one_event() {
        let clock = clock();
        let mut engine = engine(&clock);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        engine.subscribe(move |event| {
            let name = serde_json::to_value(event).unwrap()["type"]
                .as_str()
                .unwrap()
                .to_string();
            s.lock().unwrap().push(name);
        });

        engine.start_session(SessionType::Manual, None).unwrap();
        engine.start_session(SessionType::Manual, None).unwrap();
        engine.end_session().unwrap();
        engine.end_session().unwrap();
        engine.set_setting("strictMode", "false").unwrap();
        engine.update_allowed_app("news", true).unwrap();
        engine.reset_all_data().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "SessionStarted",
                "SessionStarted",
                "SessionEnded",
                "SettingsChanged",
                "AllowedAppsChanged",
                "DataReset"
            ]
        );
    }

    #[test]
    fn session_is_dated_by_its_start() {
        let clock = ManualClock::new(DateTime::parse_from_rfc3339("2024-05-06T23:50:00+02:00").unwrap());
        let mut engine = engine(&clock);
        engine.start_session(SessionType::Manual, Some(25)).unwrap();
        clock.advance(Duration::minutes(25));
        engine.end_session().unwrap();

        let may6 = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(engine.sessions_on(may6).unwrap().len(), 1);
        assert!(engine.today_sessions().unwrap().is_empty());
    }

    #[test]
    fn state_survives_reinit() {
        let clock = clock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusplus.db");
        let open = |clock: &ManualClock| {
            let store = crate::storage::SqliteStore::open(&path).unwrap();
            FocusEngine::init(Box::new(store), Arc::new(clock.clone()), EngineConfig::default())
                .unwrap()
        };

        let mut first = open(&clock);
        let s = first.start_session(SessionType::Custom, Some(30)).unwrap();
        first.dispose();

        clock.advance(Duration::minutes(30));
        let mut second = open(&clock);
        assert_eq!(second.current_session().unwrap().id, s.id);
        assert!(second.end_session().unwrap().unwrap().completed);
    }
}
