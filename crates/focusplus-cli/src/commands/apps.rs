use clap::Subcommand;
use focusplus_core::AppConfig;
use serde_json::json;

use super::{open_engine, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AppsAction {
    /// List every registered app with its flag
    List,
    /// Allow an app in future sessions
    Allow {
        /// App id (e.g. "email")
        id: String,
    },
    /// Block an app in future sessions
    Deny {
        /// App id
        id: String,
    },
    /// Check whether an app may be used right now
    Check {
        /// App id
        id: String,
    },
}

pub fn run(action: AppsAction, config: &AppConfig) -> CmdResult {
    let mut engine = open_engine(config)?;

    match action {
        AppsAction::List => print_json(&engine.allowed_apps()?)?,
        AppsAction::Allow { id } => {
            engine.update_allowed_app(&id, true)?;
            print_json(&engine.allowed_apps()?)?;
        }
        AppsAction::Deny { id } => {
            engine.update_allowed_app(&id, false)?;
            print_json(&engine.allowed_apps()?)?;
        }
        AppsAction::Check { id } => {
            print_json(&json!({
                "appId": id,
                "allowed": engine.is_app_allowed(&id),
                "inFocusMode": engine.is_in_focus_mode(),
            }))?;
        }
    }
    Ok(())
}
