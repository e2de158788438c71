use clap::Subcommand;
use focusplus_core::AppConfig;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the whole config as JSON
    Show,
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "engine.break_start_delay_ms")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction, mut config: AppConfig) -> CmdResult {
    match action {
        ConfigAction::Show => print_json(&config)?,
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown config key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            let config = AppConfig::default();
            config.save()?;
            print_json(&config)?;
        }
    }
    Ok(())
}
