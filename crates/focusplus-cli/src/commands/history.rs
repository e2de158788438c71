use clap::Args;
use focusplus_core::history::parse_date;
use focusplus_core::AppConfig;

use super::{open_engine, print_json, CmdResult};

#[derive(Args)]
pub struct HistoryArgs {
    /// Day to show, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,
}

pub fn run(args: HistoryArgs, config: &AppConfig) -> CmdResult {
    let engine = open_engine(config)?;
    let date = match args.date {
        Some(raw) => parse_date(&raw)?,
        None => engine.today(),
    };
    print_json(&engine.sessions_on(date)?)
}
