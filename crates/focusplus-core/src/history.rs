//! Per-day session history.
//!
//! Each calendar date has one append-only list under
//! `focus_sessions_<YYYY-MM-DD>`. Entries are never rewritten.

use chrono::NaiveDate;

use crate::error::{Result, ValidationError};
use crate::session::FocusSession;
use crate::storage::{read_json, sessions_key, KeyValueStore, StoreOp};

/// Finalized sessions that started on `date`, oldest first.
pub fn load_day(store: &dyn KeyValueStore, date: NaiveDate) -> Result<Vec<FocusSession>> {
    Ok(read_json(store, &sessions_key(date))?.unwrap_or_default())
}

/// The write that appends `session` to `date`'s history.
pub fn append_op(
    store: &dyn KeyValueStore,
    date: NaiveDate,
    session: &FocusSession,
) -> Result<StoreOp> {
    let mut sessions = load_day(store, date)?;
    sessions.push(session.clone());
    StoreOp::set_json(sessions_key(date), &sessions)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}
