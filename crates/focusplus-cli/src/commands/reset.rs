use clap::Args;
use focusplus_core::AppConfig;
use serde_json::json;

use super::{open_engine, print_json, CmdResult};

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm deletion of all sessions, settings and app flags
    #[arg(long)]
    yes: bool,
}

pub fn run(args: ResetArgs, config: &AppConfig) -> CmdResult {
    if !args.yes {
        return Err("refusing to delete focus data without --yes".into());
    }
    let mut engine = open_engine(config)?;
    engine.reset_all_data()?;
    print_json(&json!({ "type": "DataReset" }))
}
