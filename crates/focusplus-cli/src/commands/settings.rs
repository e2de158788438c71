use clap::Subcommand;
use focusplus_core::AppConfig;

use super::{open_engine, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print all focus settings
    Show,
    /// Get one setting
    Get {
        /// Setting name (e.g. "pomodoroWorkDuration", "strictMode")
        key: String,
    },
    /// Set one setting
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: SettingsAction, config: &AppConfig) -> CmdResult {
    let mut engine = open_engine(config)?;

    match action {
        SettingsAction::Show => print_json(&engine.settings()?)?,
        SettingsAction::Get { key } => match engine.settings()?.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown setting: {key}").into()),
        },
        SettingsAction::Set { key, value } => {
            let settings = engine.set_setting(&key, &value)?;
            print_json(&settings)?;
        }
    }
    Ok(())
}
