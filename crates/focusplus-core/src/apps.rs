//! Allowed-app registry, persisted under `focus_allowed_apps`.
//!
//! The set of ids is fixed; only each entry's `is_allowed` flag changes.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::storage::{read_json, KeyValueStore, ALLOWED_APPS_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedApp {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub category: String,
    pub is_allowed: bool,
}

impl AllowedApp {
    fn new(id: &str, name: &str, icon: &str, category: &str, is_allowed: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            category: category.into(),
            is_allowed,
        }
    }
}

/// The registry a fresh install starts with.
pub fn default_apps() -> Vec<AllowedApp> {
    vec![
        AllowedApp::new("focusplus", "FOCUSPLUS+", "🎯", "Productivity", true),
        AllowedApp::new("email", "Email", "📧", "Productivity", true),
        AllowedApp::new("calendar", "Calendar", "📅", "Productivity", true),
        AllowedApp::new("notes", "Notes", "📝", "Productivity", true),
        AllowedApp::new("music", "Music", "🎵", "Entertainment", true),
        AllowedApp::new("social_media", "Social Media", "📱", "Social", false),
        AllowedApp::new("games", "Games", "🎮", "Entertainment", false),
        AllowedApp::new("video", "Video Streaming", "📺", "Entertainment", false),
        AllowedApp::new("shopping", "Shopping", "🛒", "Lifestyle", false),
        AllowedApp::new("news", "News", "📰", "Information", false),
    ]
}

/// Stored registry, or the defaults when nothing is stored yet.
pub fn load(store: &dyn KeyValueStore) -> Result<Vec<AllowedApp>> {
    Ok(read_json(store, ALLOWED_APPS_KEY)?.unwrap_or_else(default_apps))
}

/// Copy of `apps` with the flag for `app_id` set.
///
/// # Errors
/// Returns [`CoreError::UnknownAppId`] if no entry has that id.
pub fn with_flag(apps: &[AllowedApp], app_id: &str, is_allowed: bool) -> Result<Vec<AllowedApp>> {
    let mut updated = apps.to_vec();
    let entry = updated
        .iter_mut()
        .find(|app| app.id == app_id)
        .ok_or_else(|| CoreError::UnknownAppId(app_id.to_string()))?;
    entry.is_allowed = is_allowed;
    Ok(updated)
}

/// Ids currently allowed, in registry order.
pub fn allowed_ids(apps: &[AllowedApp]) -> Vec<String> {
    apps.iter()
        .filter(|app| app.is_allowed)
        .map(|app| app.id.clone())
        .collect()
}

pub fn all_ids(apps: &[AllowedApp]) -> Vec<String> {
    apps.iter().map(|app| app.id.clone()).collect()
}
