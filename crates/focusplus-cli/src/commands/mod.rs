pub mod apps;
pub mod config;
pub mod history;
pub mod reset;
pub mod session;
pub mod settings;
pub mod stats;

use std::sync::Arc;

use focusplus_core::{
    AppConfig, FocusEngine, KeyValueStore, MemoryStore, SqliteStore, StorageBackend, SystemClock,
};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the engine on the configured store and let any due break start.
pub fn open_engine(config: &AppConfig) -> Result<FocusEngine, Box<dyn std::error::Error>> {
    let store: Box<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.database_path()?)?),
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };
    let mut engine = FocusEngine::init(store, Arc::new(SystemClock), config.engine.clone())?;
    engine.tick()?;
    Ok(engine)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
