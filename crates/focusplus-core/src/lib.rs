//! # FOCUSPLUS+ Core Library
//!
//! This library provides the business logic behind FOCUSPLUS+ focus mode:
//! timed focus sessions, the allowed-app registry, Pomodoro cycling, and the
//! per-day history those sessions leave behind. The `focusplus` CLI is a thin
//! layer over the same library.
//!
//! ## Architecture
//!
//! - **Focus Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` so scheduled breaks can start
//! - **Storage**: A string key-value store holding JSON values, backed by
//!   SQLite or kept in memory
//! - **Notification Bus**: Synchronous subscribers receiving one [`Event`] per
//!   engine mutation
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: Session state machine and single entry point
//! - [`KeyValueStore`]: Persistence capability injected into the engine
//! - [`FocusSettings`]: Durations and behaviour flags
//! - [`AppConfig`]: Process configuration from `config.toml`

pub mod apps;
pub mod bus;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;

pub use apps::AllowedApp;
pub use bus::{NotificationBus, Subscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, EngineConfig, StorageBackend};
pub use engine::{FocusEngine, PendingBreak};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use session::{FocusSession, SessionType};
pub use settings::{FocusSettings, SettingsPatch};
pub use stats::{format_duration, DailySummary};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
